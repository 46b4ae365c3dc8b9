use crate::lookup::{Lookup, LookupError, LookupKind, WordRecord, WordSource};
use crate::view::{self, OutputView};
use serde::Serialize;
use tracing::{error, info};

/// Words the user saved during this session, in the order saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Favorites {
    words: Vec<String>,
}

impl Favorites {
    pub fn push(&mut self, word: impl Into<String>) {
        self.words.push(word.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    QueryChanged(String),
    RhymeClicked,
    SimilarClicked,
    /// A key pressed while the query input has focus.
    KeyPressed(Key),
    SaveClicked(String),
}

/// Owns everything the page mutates: query text, output region, favorites.
pub struct PageController<S> {
    source: S,
    query: String,
    output: OutputView,
    favorites: Favorites,
}

impl<S: WordSource> PageController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            query: String::new(),
            output: OutputView::Idle,
            favorites: Favorites::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn output(&self) -> &OutputView {
        &self.output
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn saved_summary(&self) -> String {
        view::saved_summary(&self.favorites)
    }

    /// Applies `event` and returns the lookup it triggered, if any. A
    /// triggered lookup puts the output region into the loading state.
    pub fn begin(&mut self, event: PageEvent) -> Option<Lookup> {
        let kind = match event {
            PageEvent::QueryChanged(query) => {
                self.query = query;
                return None;
            }
            PageEvent::SaveClicked(word) => {
                info!(word = %word, saved = self.favorites.len() + 1, "saving word");
                self.favorites.push(word);
                return None;
            }
            PageEvent::RhymeClicked | PageEvent::KeyPressed(Key::Enter) => LookupKind::Rhymes,
            PageEvent::SimilarClicked => LookupKind::Similar,
            PageEvent::KeyPressed(_) => return None,
        };
        self.output = OutputView::Loading;
        Some(Lookup::new(kind, self.query.clone()))
    }

    /// Renders a finished lookup. Failures are logged and leave the output
    /// region as it is.
    pub fn complete(&mut self, lookup: &Lookup, result: Result<Vec<WordRecord>, LookupError>) {
        match result {
            Ok(records) => {
                info!(
                    kind = %lookup.kind,
                    query = %lookup.query,
                    count = records.len(),
                    "rendering lookup"
                );
                self.output = view::render(lookup.kind, &lookup.query, &records);
            }
            Err(err) => {
                error!(kind = %lookup.kind, query = %lookup.query, error = %err, "lookup failed");
            }
        }
    }

    /// Runs `event` end to end on the owned source.
    pub async fn dispatch(&mut self, event: PageEvent) {
        let Some(lookup) = self.begin(event) else {
            return;
        };
        let result = self.source.fetch(lookup.kind, &lookup.query).await;
        self.complete(&lookup, result);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned word source: rhymes for "cat", similar words for "same",
    /// nothing otherwise; "broken" fails.
    #[derive(Clone, Default)]
    pub(crate) struct StubSource {
        pub calls: Arc<AtomicUsize>,
    }

    impl WordSource for StubSource {
        async fn fetch(
            &self,
            kind: LookupKind,
            word: &str,
        ) -> Result<Vec<WordRecord>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if word == "broken" {
                return Err(LookupError::Status(500));
            }
            let records = match (kind, word) {
                (LookupKind::Rhymes, "cat") => vec![
                    WordRecord::new("hat").with_syllables(1),
                    WordRecord::new("combat").with_syllables(2),
                    WordRecord::new("bat").with_syllables(1),
                ],
                (LookupKind::Similar, "same") => {
                    vec![WordRecord::new("alike"), WordRecord::new("equal")]
                }
                _ => Vec::new(),
            };
            Ok(records)
        }
    }

    fn words(view: &OutputView) -> Vec<String> {
        view.items().iter().map(|item| item.word.clone()).collect()
    }

    #[tokio::test]
    async fn rhyme_click_renders_grouped_rhymes() {
        let mut page = PageController::new(StubSource::default());
        page.dispatch(PageEvent::QueryChanged("cat".into())).await;
        page.dispatch(PageEvent::RhymeClicked).await;
        assert_eq!(words(page.output()), vec!["hat", "bat", "combat"]);
    }

    #[tokio::test]
    async fn enter_key_matches_rhyme_click() {
        let mut clicked = PageController::new(StubSource::default());
        clicked.dispatch(PageEvent::QueryChanged("cat".into())).await;
        clicked.dispatch(PageEvent::RhymeClicked).await;

        let mut typed = PageController::new(StubSource::default());
        typed.dispatch(PageEvent::QueryChanged("cat".into())).await;
        typed.dispatch(PageEvent::KeyPressed(Key::Enter)).await;

        assert_eq!(clicked.output(), typed.output());
    }

    #[tokio::test]
    async fn other_keys_do_not_trigger_lookups() {
        let source = StubSource::default();
        let mut page = PageController::new(source.clone());
        page.dispatch(PageEvent::QueryChanged("cat".into())).await;
        page.dispatch(PageEvent::KeyPressed(Key::Char('x'))).await;
        page.dispatch(PageEvent::KeyPressed(Key::Other)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(page.output(), &OutputView::Idle);
    }

    #[tokio::test]
    async fn similar_click_renders_flat_list() {
        let mut page = PageController::new(StubSource::default());
        page.dispatch(PageEvent::QueryChanged("same".into())).await;
        page.dispatch(PageEvent::SimilarClicked).await;
        assert!(matches!(page.output(), OutputView::Similar { .. }));
        assert_eq!(words(page.output()), vec!["alike", "equal"]);
    }

    #[tokio::test]
    async fn empty_answer_shows_no_results() {
        let mut page = PageController::new(StubSource::default());
        page.dispatch(PageEvent::QueryChanged("zzz".into())).await;
        page.dispatch(PageEvent::SimilarClicked).await;
        assert_eq!(page.output(), &OutputView::NoResults);
    }

    #[tokio::test]
    async fn failed_lookup_stays_loading() {
        let mut page = PageController::new(StubSource::default());
        page.dispatch(PageEvent::SaveClicked("kept".into())).await;
        page.dispatch(PageEvent::QueryChanged("broken".into())).await;
        page.dispatch(PageEvent::RhymeClicked).await;
        assert!(page.output().is_loading());
        assert_eq!(page.saved_summary(), "kept");
    }

    #[test]
    fn begin_marks_loading_and_returns_lookup() {
        let mut page = PageController::new(StubSource::default());
        assert!(page.begin(PageEvent::QueryChanged("cat".into())).is_none());
        let lookup = page.begin(PageEvent::SimilarClicked).unwrap();
        assert_eq!(lookup, Lookup::new(LookupKind::Similar, "cat"));
        assert!(page.output().is_loading());
    }

    #[test]
    fn later_completion_overwrites_earlier_one() {
        let mut page = PageController::new(StubSource::default());
        page.begin(PageEvent::QueryChanged("cat".into()));
        let first = page.begin(PageEvent::RhymeClicked).unwrap();
        page.begin(PageEvent::QueryChanged("same".into()));
        let second = page.begin(PageEvent::SimilarClicked).unwrap();

        page.complete(&second, Ok(vec![WordRecord::new("alike")]));
        page.complete(&first, Ok(vec![WordRecord::new("hat").with_syllables(1)]));
        assert!(matches!(page.output(), OutputView::Rhymes { .. }));
    }

    #[tokio::test]
    async fn saving_appends_without_dedup() {
        let mut page = PageController::new(StubSource::default());
        page.dispatch(PageEvent::SaveClicked("hat".into())).await;
        page.dispatch(PageEvent::SaveClicked("bat".into())).await;
        page.dispatch(PageEvent::SaveClicked("hat".into())).await;
        assert_eq!(page.favorites().len(), 3);
        assert_eq!(page.saved_summary(), "hat, bat, hat");
    }
}
