use async_trait::async_trait;

use crate::error::Result;
use crate::models::{SearchQuery, SearchSnippet};

#[async_trait]
pub trait SearchHandler {
    /// Search the web; snippets come back in the provider's relevance order
    async fn handle_search(&self, query: &str) -> Result<Vec<SearchSnippet>>;
}

#[async_trait]
impl SearchHandler for super::Handlers {
    async fn handle_search(&self, query: &str) -> Result<Vec<SearchSnippet>> {
        let request = SearchQuery::new(query);
        tracing::info!(
            max_results = request.max_results,
            depth = %request.search_depth,
            "Searching the web for: {}",
            query
        );

        let response = self.search.search(&request).await?;
        let snippets: Vec<SearchSnippet> =
            response.results.into_iter().map(SearchSnippet::from).collect();

        tracing::info!("Search returned {} snippets", snippets.len());
        Ok(snippets)
    }
}
