use async_trait::async_trait;
use crate::types::{FetchOutcome, SearchHit};
use crate::Result;

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the name of the content provider
    fn name(&self) -> &str;

    /// Keyword search, ranked the way the provider ranks it
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Full plain-text article for an id returned by `search`
    async fn fetch(&self, external_id: i64) -> Result<FetchOutcome>;
}
