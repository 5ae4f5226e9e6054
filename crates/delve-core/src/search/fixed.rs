use async_trait::async_trait;

use super::{SearchDocument, SearchError, SearchProvider};

/// A search provider that always returns the same documents.
#[derive(Debug, Clone, Default)]
pub struct StaticSearch {
    documents: Vec<SearchDocument>,
}

impl StaticSearch {
    pub fn new(documents: Vec<SearchDocument>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, count: usize) -> Result<Vec<SearchDocument>, SearchError> {
        Ok(self.documents.iter().take(count).cloned().collect())
    }
}
