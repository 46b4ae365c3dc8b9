use std::error::Error;
use std::io::Write;

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wordmuse_rs::view::{self, OutputView};
use wordmuse_rs::{
    ClientConfig, DATAMUSE_WORDS_URL, DatamuseClient, Key, LookupKind, PageController, PageEvent,
    WordSource,
};

#[derive(Parser, Debug)]
#[command(
    name = "wordmuse-rs",
    about = "Find rhymes and similar words via Datamuse",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Word service endpoint.
    #[arg(long, global = true, default_value = DATAMUSE_WORDS_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List words that rhyme with WORD, grouped by syllable count.
    Rhymes { word: String },
    /// List words with a meaning similar to WORD.
    Similar { word: String },
    /// Interactive session: type a word and press Enter for rhymes.
    Session,
    /// Serve the lookup page over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Page styling: tailwind or bootstrap.
        #[arg(long, default_value = "tailwind", value_parser = parse_theme)]
        theme: wordmuse_rs::web::WebTheme,
        /// Public base URL used in logs and links.
        #[arg(long)]
        base_url: Option<String>,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let client = DatamuseClient::new(ClientConfig {
        base_url: cli.api_url.clone(),
        ..ClientConfig::default()
    })?;
    match cli.command {
        Command::Rhymes { word } => {
            init_tracing("warn");
            runtime.block_on(handle_lookup(&client, LookupKind::Rhymes, &word, cli.json))
        }
        Command::Similar { word } => {
            init_tracing("warn");
            runtime.block_on(handle_lookup(&client, LookupKind::Similar, &word, cli.json))
        }
        Command::Session => {
            init_tracing("warn");
            runtime.block_on(handle_session(client, cli.json))
        }
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            theme,
            base_url,
        } => {
            init_tracing("info");
            let config = wordmuse_rs::web::WebConfig {
                addr,
                theme,
                base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
            };
            runtime.block_on(wordmuse_rs::web::serve(config, client))?;
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(feature = "web")]
fn parse_theme(value: &str) -> Result<wordmuse_rs::web::WebTheme, String> {
    use wordmuse_rs::web::WebTheme;
    match value.to_ascii_lowercase().as_str() {
        "tailwind" => Ok(WebTheme::Tailwind),
        "bootstrap" => Ok(WebTheme::Bootstrap),
        other => Err(format!("unknown theme {other:?} (expected tailwind or bootstrap)")),
    }
}

async fn handle_lookup<S: WordSource>(
    client: &S,
    kind: LookupKind,
    word: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let word = word.trim();
    let records = client.fetch(kind, word).await?;
    let output = view::render(kind, word, &records);
    print_view(&output, as_json)
}

#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Query(String),
    Lookup(LookupKind),
    Save(usize),
    Saved,
    Help,
    Quit,
    Nothing,
}

fn parse_session_line(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(SessionCommand::Nothing);
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(SessionCommand::Query(line.to_string()));
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("rhymes"), None) => Ok(SessionCommand::Lookup(LookupKind::Rhymes)),
        (Some("similar"), None) => Ok(SessionCommand::Lookup(LookupKind::Similar)),
        (Some("save"), Some(position)) => position
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(SessionCommand::Save)
            .ok_or_else(|| format!("Not a list position: {position:?}")),
        (Some("saved"), None) => Ok(SessionCommand::Saved),
        (Some("help"), None) => Ok(SessionCommand::Help),
        (Some("quit" | "q"), None) => Ok(SessionCommand::Quit),
        _ => Err(format!("Unknown command {line:?}; try :help")),
    }
}

const SESSION_HELP: &str = "Type a word and press Enter to list rhymes.
  :rhymes     rhymes for the current word
  :similar    words with a similar meaning
  :save N     save the N-th listed word
  :saved      show saved words
  :quit       leave the session";

async fn handle_session<S: WordSource>(source: S, as_json: bool) -> Result<(), Box<dyn Error>> {
    let mut page = PageController::new(source);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{SESSION_HELP}");
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_session_line(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match command {
            SessionCommand::Nothing => continue,
            SessionCommand::Quit => break,
            SessionCommand::Help => println!("{SESSION_HELP}"),
            SessionCommand::Query(word) => {
                page.dispatch(PageEvent::QueryChanged(word)).await;
                page.dispatch(PageEvent::KeyPressed(Key::Enter)).await;
                print_view(page.output(), as_json)?;
            }
            SessionCommand::Lookup(kind) => {
                let event = match kind {
                    LookupKind::Rhymes => PageEvent::RhymeClicked,
                    LookupKind::Similar => PageEvent::SimilarClicked,
                };
                page.dispatch(event).await;
                print_view(page.output(), as_json)?;
            }
            SessionCommand::Save(position) => {
                let word = page
                    .output()
                    .items()
                    .get(position - 1)
                    .map(|item| item.save.word.clone());
                match word {
                    Some(word) => {
                        page.dispatch(PageEvent::SaveClicked(word)).await;
                        print_saved(&page.saved_summary(), as_json)?;
                    }
                    None => eprintln!("No listed word at position {position}"),
                }
            }
            SessionCommand::Saved => print_saved(&page.saved_summary(), as_json)?,
        }
    }
    Ok(())
}

fn print_view(output: &OutputView, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        render_markdown_block(&view::to_markdown(output));
    }
    Ok(())
}

fn print_saved(summary: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "saved": summary }))?);
    } else {
        println!("Saved words: {summary}");
    }
    Ok(())
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
