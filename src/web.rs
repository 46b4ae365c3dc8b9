use crate::page::{Key, PageController, PageEvent};
use crate::view::{self, OutputView};
use crate::{Lookup, LookupKind, WordSource};
use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

type SharedState<S> = Arc<AppState<S>>;

/// One page, shared by every request the server handles.
pub struct AppState<S> {
    pub page: RwLock<PageController<S>>,
    pub theme: WebTheme,
    pub base_url: String,
}

impl<S: WordSource> AppState<S> {
    pub fn new(source: S, theme: WebTheme, base_url: impl Into<String>) -> Self {
        Self {
            page: RwLock::new(PageController::new(source)),
            theme,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum WebTheme {
    #[default]
    Tailwind,
    Bootstrap,
}

impl fmt::Display for WebTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebTheme::Tailwind => write!(f, "tailwind"),
            WebTheme::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    use_tailwind: bool,
    use_bootstrap: bool,
    body_class: &'static str,
    main_class: &'static str,
    headline_class: &'static str,
    input_class: &'static str,
    button_class: &'static str,
    section_class: &'static str,
    save_class: &'static str,
}

impl Chrome {
    fn new(theme: WebTheme) -> Self {
        match theme {
            WebTheme::Tailwind => Self {
                use_tailwind: true,
                use_bootstrap: false,
                body_class: "bg-slate-50 text-slate-900",
                main_class: "max-w-3xl mx-auto py-10 px-4 space-y-6",
                headline_class: "text-3xl font-bold",
                input_class: "border border-slate-300 rounded px-3 py-2",
                button_class: "rounded bg-slate-900 px-3 py-2 text-white font-semibold",
                section_class: "text-lg font-semibold mt-4",
                save_class: "text-xs text-blue-700 hover:underline",
            },
            WebTheme::Bootstrap => Self {
                use_tailwind: false,
                use_bootstrap: true,
                body_class: "bg-light text-dark",
                main_class: "container py-5",
                headline_class: "display-6 fw-bold",
                input_class: "form-control d-inline-block w-auto",
                button_class: "btn btn-primary",
                section_class: "h5 mt-3",
                save_class: "btn btn-link btn-sm",
            },
        }
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub theme: WebTheme,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            theme: WebTheme::default(),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve<S>(config: WebConfig, source: S) -> Result<(), WebError>
where
    S: WordSource + Clone + Send + Sync + 'static,
{
    let state = Arc::new(AppState::new(source, config.theme, config.base_url));
    info!(
        %config.addr,
        theme = %state.theme,
        base = %state.base_url,
        "Binding HTTP listener"
    );
    let router = build_router(state);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router<S>(state: SharedState<S>) -> Router
where
    S: WordSource + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(page_html::<S>))
        .route("/lookup", get(lookup_html::<S>))
        .route("/save", post(save_word::<S>))
        .route("/api/rhymes", get(api_rhymes::<S>))
        .route("/api/similar", get(api_similar::<S>))
        .route("/api/favorites", get(api_favorites::<S>))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "wordmuse-web" }))
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    word: Option<String>,
    action: Option<LookupKind>,
}

#[derive(Debug, Deserialize)]
struct WordParams {
    word: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveForm {
    word: String,
}

async fn page_html<S: WordSource + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
) -> Html<String> {
    let chrome = Chrome::new(state.theme);
    let template = {
        let page = state.page.read();
        PageTemplate::new(chrome, page.query(), page.output(), page.saved_summary())
    };
    Html(template.render().unwrap_or_else(|err| {
        warn!(error = %err, "page template failed to render");
        format!("<p>{}</p>", view::NO_RESULTS)
    }))
}

async fn lookup_html<S: WordSource + Clone + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<LookupParams>,
) -> Redirect {
    let query = params.word.unwrap_or_default().trim().to_string();
    // Submitting the form from the input with Enter carries no button value.
    let trigger = match params.action {
        Some(LookupKind::Rhymes) => PageEvent::RhymeClicked,
        Some(LookupKind::Similar) => PageEvent::SimilarClicked,
        None => PageEvent::KeyPressed(Key::Enter),
    };
    let (lookup, source) = {
        let mut page = state.page.write();
        page.begin(PageEvent::QueryChanged(query));
        (page.begin(trigger), page.source().clone())
    };
    if let Some(lookup) = lookup {
        let result = source.fetch(lookup.kind, &lookup.query).await;
        state.page.write().complete(&lookup, result);
    }
    Redirect::to("/")
}

async fn save_word<S: WordSource + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
    Form(form): Form<SaveForm>,
) -> Redirect {
    state.page.write().begin(PageEvent::SaveClicked(form.word));
    Redirect::see_other("/")
}

async fn api_rhymes<S: WordSource + Clone + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<WordParams>,
) -> Result<Json<OutputView>, ApiError> {
    api_lookup(&state, LookupKind::Rhymes, params).await
}

async fn api_similar<S: WordSource + Clone + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<WordParams>,
) -> Result<Json<OutputView>, ApiError> {
    api_lookup(&state, LookupKind::Similar, params).await
}

async fn api_lookup<S: WordSource + Clone + Send + Sync + 'static>(
    state: &AppState<S>,
    kind: LookupKind,
    params: WordParams,
) -> Result<Json<OutputView>, ApiError> {
    let word = params
        .word
        .as_ref()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `word` is required"))?;
    let lookup = Lookup::new(kind, word);
    let source = state.page.read().source().clone();
    let records = source
        .fetch(lookup.kind, &lookup.query)
        .await
        .map_err(|err| {
            warn!(%kind, word = %lookup.query, error = %err, "api lookup failed");
            ApiError::bad_gateway(err.to_string())
        })?;
    Ok(Json(view::render(lookup.kind, &lookup.query, &records)))
}

async fn api_favorites<S: WordSource + Send + Sync + 'static>(
    State(state): State<SharedState<S>>,
) -> impl IntoResponse {
    let page = state.page.read();
    Json(json!({
        "words": page.favorites(),
        "summary": page.saved_summary(),
    }))
}

struct SectionBlock {
    title: String,
    words: Vec<String>,
}

impl PageTemplate {
    fn new(chrome: Chrome, query: &str, output: &OutputView, summary: String) -> Self {
        let sections = match output {
            OutputView::Rhymes { sections, .. } => sections
                .iter()
                .map(|section| SectionBlock {
                    title: section.heading(),
                    words: section.items.iter().map(|item| item.save.word.clone()).collect(),
                })
                .collect(),
            OutputView::Similar { items, .. } => vec![SectionBlock {
                title: String::new(),
                words: items.iter().map(|item| item.save.word.clone()).collect(),
            }],
            _ => Vec::new(),
        };
        Self {
            chrome,
            query: query.to_string(),
            heading: output.heading().unwrap_or_default(),
            loading: output.is_loading(),
            no_results: matches!(output, OutputView::NoResults),
            no_results_text: view::NO_RESULTS,
            sections,
            summary,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Wordmuse • Rhymes and similar words</title>
    {% if chrome.use_tailwind %}
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    {% endif %}
    {% if chrome.use_bootstrap %}
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet">
    {% endif %}
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <h1 class="{{ chrome.headline_class }}">Rhymes and similar words</h1>
      <form method="get" action="/lookup" id="lookup">
        <input id="word_input" class="{{ chrome.input_class }}" type="text" name="word" value="{{ query }}" autofocus />
        <button id="show_rhymes" class="{{ chrome.button_class }}" type="submit" name="action" value="rhymes">Show rhyming words</button>
        <button id="show_synonyms" class="{{ chrome.button_class }}" type="submit" name="action" value="similar">Show synonyms</button>
      </form>
      <p>Saved words: <span id="saved_words">{{ summary }}</span></p>
      <section id="word_output">
        {% if loading %}
        <p>...loading</p>
        {% endif %}
        {% if no_results %}
        <p>{{ no_results_text }}</p>
        {% endif %}
        {% if heading.len() > 0 %}
        <h2 class="{{ chrome.section_class }}">{{ heading }}</h2>
        {% endif %}
        {% for section in sections %}
        {% if section.title.len() > 0 %}
        <h3 class="{{ chrome.section_class }}">{{ section.title }}</h3>
        {% endif %}
        <ul>
          {% for word in section.words %}
          <li>
            <form method="post" action="/save" class="inline">
              {{ word }}
              <input type="hidden" name="word" value="{{ word }}" />
              <button class="{{ chrome.save_class }}" type="submit">(save)</button>
            </form>
          </li>
          {% endfor %}
        </ul>
        {% endfor %}
      </section>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate {
    chrome: Chrome,
    query: String,
    heading: String,
    loading: bool,
    no_results: bool,
    no_results_text: &'static str,
    sections: Vec<SectionBlock>,
    summary: String,
}
