use serde::{Deserialize, Serialize};

use crate::search::SearchDocument;

/// A search result that passed the relevance filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub content: String,
    /// 1-based position in the unfiltered result list.
    pub index: usize,
    /// Number of unfiltered results.
    pub total: usize,
}

/// Keeps documents whose text is longer than `min_chars` characters,
/// preserving provider order.
pub fn select_sources(documents: &[SearchDocument], min_chars: usize) -> Vec<Source> {
    let total = documents.len();

    documents
        .iter()
        .enumerate()
        .filter(|(_, doc)| doc.text.chars().count() > min_chars)
        .map(|(i, doc)| Source {
            title: doc.title.clone(),
            url: doc.url.clone(),
            content: doc.text.clone(),
            index: i + 1,
            total,
        })
        .collect()
}
