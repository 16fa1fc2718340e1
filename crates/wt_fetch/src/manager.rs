use std::sync::Arc;
use tracing::{info, warn};
use wt_core::{
    ArticleRepository, ContentSource, FetchOutcome, Result, SearchHit, StoredArticleRecord,
    TokenizedArticle,
};
use wt_tokenize::TokenizationService;

#[derive(Debug)]
pub enum DownloadOutcome {
    Stored {
        record: StoredArticleRecord,
        article: TokenizedArticle,
    },
    /// The provider answered but had no text for this id; nothing was stored.
    Unavailable { external_id: i64 },
}

/// Fetch → tokenize → store, plus pass-through access to stored articles.
pub struct ArticlePipeline {
    source: Arc<dyn ContentSource>,
    tokenizer: TokenizationService,
    storage: Arc<dyn ArticleRepository>,
}

impl ArticlePipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        tokenizer: TokenizationService,
        storage: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            source,
            tokenizer,
            storage,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn tokenizer(&self) -> &TokenizationService {
        &self.tokenizer
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.source.search(query, limit).await
    }

    pub async fn download(&self, external_id: i64) -> Result<DownloadOutcome> {
        let article = match self.source.fetch(external_id).await? {
            FetchOutcome::Available(article) => article,
            FetchOutcome::Unavailable { external_id } => {
                warn!("⚠️ {} has no content for article {}", self.source_name(), external_id);
                return Ok(DownloadOutcome::Unavailable { external_id });
            }
        };

        info!(
            "🔤 Tokenizing '{}' ({} words) with the {} strategy",
            article.title,
            article.word_count(),
            self.tokenizer.strategy_name()
        );
        let tokenized = self.tokenizer.tokenize_article(article)?;

        let record = self.storage.save(&tokenized).await?;
        info!("✅ Stored '{}' with {} tokens", record.title, record.token_count);
        Ok(DownloadOutcome::Stored {
            record,
            article: tokenized,
        })
    }

    pub async fn list(&self) -> Result<Vec<StoredArticleRecord>> {
        self.storage.get_all().await
    }

    pub async fn find(&self, file_key: &str) -> Result<Option<StoredArticleRecord>> {
        self.storage.find(file_key).await
    }

    pub async fn load(&self, record: &StoredArticleRecord) -> Result<TokenizedArticle> {
        self.storage.load(record).await
    }

    pub async fn delete(&self, record: &StoredArticleRecord) -> Result<()> {
        self.storage.delete(record).await
    }

    pub async fn exists(&self, record: &StoredArticleRecord) -> Result<bool> {
        self.storage.exists(record).await
    }
}
