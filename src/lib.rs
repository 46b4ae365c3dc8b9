mod group;
mod lookup;
mod page;
pub mod view;

#[cfg(feature = "web")]
pub mod web;

pub use group::{GroupKey, Grouped, group_by, group_by_field};
pub use lookup::{
    ClientConfig, DATAMUSE_WORDS_URL, DatamuseClient, Lookup, LookupError, LookupKind, WordRecord,
    WordSource,
};
pub use page::{Favorites, Key, PageController, PageEvent};
pub use view::OutputView;
