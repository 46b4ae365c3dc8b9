//! Pure rendering of lookup results into a description of the output region.
//!
//! Adapters (terminal, HTML) only ever consume [`OutputView`]; nothing here
//! touches a document or a terminal.

use crate::group::group_by;
use crate::lookup::{LookupKind, WordRecord};
use crate::page::Favorites;
use serde::Serialize;
use std::fmt::Write as _;

pub const NO_RESULTS: &str = "(no results)";
pub const NOTHING_SAVED: &str = "(none)";
pub const SAVED_DELIMITER: &str = ", ";

/// What the output region currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutputView {
    #[default]
    Idle,
    Loading,
    NoResults,
    Rhymes {
        query: String,
        sections: Vec<SyllableSection>,
    },
    Similar {
        query: String,
        items: Vec<WordItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllableSection {
    pub syllables: Option<u32>,
    pub items: Vec<WordItem>,
}

impl SyllableSection {
    pub fn heading(&self) -> String {
        match self.syllables {
            Some(1) => "1 syllable".to_string(),
            Some(count) => format!("{count} syllables"),
            None => "Unknown syllable count".to_string(),
        }
    }
}

/// A rendered word plus the save action attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordItem {
    pub word: String,
    pub save: SaveAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveAction {
    pub word: String,
}

impl WordItem {
    fn from_record(record: &WordRecord) -> Self {
        Self {
            word: record.word.clone(),
            save: SaveAction {
                word: record.word.clone(),
            },
        }
    }
}

impl OutputView {
    pub fn heading(&self) -> Option<String> {
        match self {
            OutputView::Rhymes { query, .. } => Some(format!("Words that rhyme with {query}:")),
            OutputView::Similar { query, .. } => {
                Some(format!("Words with a meaning similar to {query}:"))
            }
            _ => None,
        }
    }

    /// All rendered items in display order.
    pub fn items(&self) -> Vec<&WordItem> {
        match self {
            OutputView::Rhymes { sections, .. } => sections
                .iter()
                .flat_map(|section| section.items.iter())
                .collect(),
            OutputView::Similar { items, .. } => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, OutputView::Loading)
    }
}

pub fn render(kind: LookupKind, query: &str, records: &[WordRecord]) -> OutputView {
    match kind {
        LookupKind::Rhymes => render_rhymes(query, records),
        LookupKind::Similar => render_similar(query, records),
    }
}

pub fn render_rhymes(query: &str, records: &[WordRecord]) -> OutputView {
    if records.is_empty() {
        return OutputView::NoResults;
    }
    // Records without a syllable count go last.
    let sections = group_by(records, |record| {
        (record.num_syllables.is_none(), record.num_syllables)
    })
    .into_iter()
    .map(|((_, syllables), members)| SyllableSection {
        syllables,
        items: members.into_iter().map(WordItem::from_record).collect(),
    })
    .collect();
    OutputView::Rhymes {
        query: query.to_string(),
        sections,
    }
}

pub fn render_similar(query: &str, records: &[WordRecord]) -> OutputView {
    if records.is_empty() {
        return OutputView::NoResults;
    }
    OutputView::Similar {
        query: query.to_string(),
        items: records.iter().map(WordItem::from_record).collect(),
    }
}

pub fn saved_summary(favorites: &Favorites) -> String {
    if favorites.is_empty() {
        return NOTHING_SAVED.to_string();
    }
    favorites
        .iter()
        .collect::<Vec<_>>()
        .join(SAVED_DELIMITER)
}

/// Markdown form of the view; items are numbered so a terminal user can pick
/// one to save.
pub fn to_markdown(view: &OutputView) -> String {
    let mut out = String::new();
    match view {
        OutputView::Idle => {}
        OutputView::Loading => out.push_str("*...loading*\n"),
        OutputView::NoResults => {
            let _ = writeln!(out, "{NO_RESULTS}");
        }
        OutputView::Rhymes { sections, .. } => {
            if let Some(heading) = view.heading() {
                let _ = writeln!(out, "## {heading}\n");
            }
            let mut position = 1;
            for section in sections {
                let _ = writeln!(out, "### {}\n", section.heading());
                for item in &section.items {
                    let _ = writeln!(out, "{position}. {}", item.word);
                    position += 1;
                }
                out.push('\n');
            }
        }
        OutputView::Similar { items, .. } => {
            if let Some(heading) = view.heading() {
                let _ = writeln!(out, "## {heading}\n");
            }
            for (index, item) in items.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", index + 1, item.word);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rhyme_records() -> Vec<WordRecord> {
        vec![
            WordRecord::new("hat").with_syllables(1),
            WordRecord::new("acrobat").with_syllables(3),
            WordRecord::new("bat").with_syllables(1),
            WordRecord::new("unsophisticated").with_syllables(6),
            WordRecord::new("combat").with_syllables(2),
            WordRecord::new("cat-o'-nine-tails-and-so-on-and-so-forth").with_syllables(10),
        ]
    }

    #[test]
    fn rhymes_are_sectioned_by_syllable_count() {
        let view = render_rhymes("cat", &rhyme_records());
        let OutputView::Rhymes { query, sections } = &view else {
            panic!("expected rhymes view, got {view:?}");
        };
        assert_eq!(query, "cat");
        let counts: Vec<_> = sections.iter().map(|s| s.syllables).collect();
        assert_eq!(
            counts,
            vec![Some(1), Some(2), Some(3), Some(6), Some(10)]
        );
        let one: Vec<_> = sections[0].items.iter().map(|i| i.word.as_str()).collect();
        assert_eq!(one, vec!["hat", "bat"]);
        assert_eq!(sections[0].heading(), "1 syllable");
        assert_eq!(sections[1].heading(), "2 syllables");
    }

    #[test]
    fn rhymes_without_syllables_get_their_own_section() {
        let records = vec![
            WordRecord::new("splat"),
            WordRecord::new("hat").with_syllables(1),
            WordRecord::new("combat").with_syllables(2),
        ];
        let view = render_rhymes("cat", &records);
        let OutputView::Rhymes { sections, .. } = view else {
            panic!("expected rhymes view");
        };
        let headings: Vec<_> = sections.iter().map(SyllableSection::heading).collect();
        assert_eq!(
            headings,
            vec!["1 syllable", "2 syllables", "Unknown syllable count"]
        );
        assert_eq!(sections[2].syllables, None);
    }

    #[test]
    fn similar_keeps_service_order() {
        let records = vec![WordRecord::new("alike"), WordRecord::new("equal")];
        let view = render_similar("same", &records);
        let words: Vec<_> = view.items().iter().map(|i| i.word.clone()).collect();
        assert_eq!(words, vec!["alike", "equal"]);
        assert_eq!(
            view.heading().as_deref(),
            Some("Words with a meaning similar to same:")
        );
    }

    #[test]
    fn empty_results_render_no_results() {
        assert_eq!(render(LookupKind::Rhymes, "zzz", &[]), OutputView::NoResults);
        assert_eq!(render(LookupKind::Similar, "zzz", &[]), OutputView::NoResults);
        assert_eq!(to_markdown(&OutputView::NoResults), "(no results)\n");
    }

    #[test]
    fn every_item_carries_its_save_action() {
        let view = render_rhymes("cat", &rhyme_records());
        for item in view.items() {
            assert_eq!(item.save.word, item.word);
        }
    }

    #[test]
    fn summary_joins_saved_words() {
        let mut favorites = Favorites::default();
        assert_eq!(saved_summary(&favorites), "(none)");
        favorites.push("hat");
        favorites.push("bat");
        favorites.push("hat");
        assert_eq!(saved_summary(&favorites), "hat, bat, hat");
    }

    #[test]
    fn markdown_numbers_items_across_sections() {
        let records = vec![
            WordRecord::new("hat").with_syllables(1),
            WordRecord::new("combat").with_syllables(2),
        ];
        let text = to_markdown(&render_rhymes("cat", &records));
        assert!(text.contains("## Words that rhyme with cat:"));
        assert!(text.contains("### 1 syllable\n\n1. hat"));
        assert!(text.contains("### 2 syllables\n\n2. combat"));
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let value = serde_json::to_value(OutputView::Loading).unwrap();
        assert_eq!(value["state"], "loading");
        let view = render_similar("same", &[WordRecord::new("alike")]);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["state"], "similar");
        assert_eq!(value["items"][0]["save"]["word"], "alike");
    }
}
