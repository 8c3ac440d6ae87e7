//! News headline types. Display-only: the ledger never consumes these.

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Publication date as supplied by the feed, when present.
    pub published: Option<String>,
}
