use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use tracing::debug;

pub const DATAMUSE_WORDS_URL: &str = "https://api.datamuse.com/words";

/// One entry returned by the word-association service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    #[serde(
        rename = "numSyllables",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub num_syllables: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    /// Fields this crate does not interpret (`tags`, `defs`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WordRecord {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            num_syllables: None,
            score: None,
            extra: Map::new(),
        }
    }

    pub fn with_syllables(mut self, count: u32) -> Self {
        self.num_syllables = Some(count);
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Rhymes,
    Similar,
}

impl LookupKind {
    /// Query-string key the service expects for this relation.
    pub fn query_param(&self) -> &'static str {
        match self {
            LookupKind::Rhymes => "rel_rhy",
            LookupKind::Similar => "ml",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Rhymes => write!(f, "rhymes"),
            LookupKind::Similar => write!(f, "similar"),
        }
    }
}

/// A request the page wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub kind: LookupKind,
    pub query: String,
}

impl Lookup {
    pub fn new(kind: LookupKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service answered with HTTP {0}")]
    Status(u16),
    #[error("response is not a list of word records: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer rhyme and similar-meaning lookups.
pub trait WordSource {
    fn fetch(
        &self,
        kind: LookupKind,
        word: &str,
    ) -> impl Future<Output = Result<Vec<WordRecord>, LookupError>> + Send;

    fn rhymes(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Vec<WordRecord>, LookupError>> + Send {
        self.fetch(LookupKind::Rhymes, word)
    }

    fn similar(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Vec<WordRecord>, LookupError>> + Send {
        self.fetch(LookupKind::Similar, word)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DATAMUSE_WORDS_URL.to_string(),
            user_agent: format!("wordmuse-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// [`WordSource`] backed by the Datamuse `/words` endpoint.
#[derive(Debug, Clone)]
pub struct DatamuseClient {
    http: reqwest::Client,
    base_url: String,
}

impl DatamuseClient {
    pub fn new(config: ClientConfig) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl WordSource for DatamuseClient {
    async fn fetch(&self, kind: LookupKind, word: &str) -> Result<Vec<WordRecord>, LookupError> {
        debug!(%kind, word, base = %self.base_url, "querying word service");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[(kind.query_param(), word)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        let records: Vec<WordRecord> = serde_json::from_slice(&body)?;
        debug!(%kind, word, count = records.len(), "word service answered");
        Ok(records)
    }
}
