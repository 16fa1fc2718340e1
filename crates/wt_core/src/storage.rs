use async_trait::async_trait;
use crate::types::{StoredArticleRecord, TokenizedArticle};
use crate::Result;

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Persist a tokenized article under a fresh key
    async fn save(&self, article: &TokenizedArticle) -> Result<StoredArticleRecord>;

    /// List every complete stored article, newest first
    async fn get_all(&self) -> Result<Vec<StoredArticleRecord>>;

    /// Read a stored article back
    async fn load(&self, record: &StoredArticleRecord) -> Result<TokenizedArticle>;

    /// Remove whatever is left of a stored article
    async fn delete(&self, record: &StoredArticleRecord) -> Result<()>;

    /// True iff every file of the record is present
    async fn exists(&self, record: &StoredArticleRecord) -> Result<bool>;

    /// Look up a stored article by its file key
    async fn find(&self, file_key: &str) -> Result<Option<StoredArticleRecord>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|record| record.file_key == file_key))
    }
}
