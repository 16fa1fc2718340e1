use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use wt_core::{ArticleRepository, Error, Result, StoredArticleRecord, TokenizedArticle};

use super::file::file_key;
use crate::{StorageBackend, StorageConfig};

#[derive(Default)]
pub struct MemoryStore {
    articles: HashMap<String, (StoredArticleRecord, TokenizedArticle)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, article: &TokenizedArticle) -> Result<StoredArticleRecord> {
        if !article.is_valid() {
            return Err(Error::Validation(
                "Cannot save an article without title, content and tokens".to_string(),
            ));
        }

        let saved_at = Utc::now();
        let base = file_key(&article.article.title, saved_at);
        let mut key = base.clone();
        let mut n = 1;
        while self.articles.contains_key(&key) {
            n += 1;
            key = format!("{}-{}", base, n);
        }

        let record = StoredArticleRecord {
            title: article.article.title.clone(),
            file_key: key.clone(),
            token_count: article.token_count(),
            saved_at,
            content_path: PathBuf::from(format!("{}.txt", key)),
            tokens_path: PathBuf::from(format!("{}_tokens.json", key)),
            metadata_path: PathBuf::from(format!("{}_metadata.json", key)),
        };
        self.articles.insert(key, (record.clone(), article.clone()));
        Ok(record)
    }

    pub fn get_all(&self) -> Vec<StoredArticleRecord> {
        let mut records = self
            .articles
            .values()
            .map(|(record, _)| record.clone())
            .collect::<Vec<_>>();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        records
    }

    pub fn load(&self, file_key: &str) -> Option<TokenizedArticle> {
        self.articles.get(file_key).map(|(_, article)| article.clone())
    }

    pub fn delete(&mut self, file_key: &str) {
        self.articles.remove(file_key);
    }

    pub fn contains(&self, file_key: &str) -> bool {
        self.articles.contains_key(file_key)
    }
}

/// Keeps articles in process memory; nothing survives a restart.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn backend_name() -> &'static str {
        "memory"
    }

    async fn open(_config: &StorageConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleRepository for MemoryStorage {
    async fn save(&self, article: &TokenizedArticle) -> Result<StoredArticleRecord> {
        let mut store = self.store.write().await;
        store.save(article)
    }

    async fn get_all(&self) -> Result<Vec<StoredArticleRecord>> {
        let store = self.store.read().await;
        Ok(store.get_all())
    }

    async fn load(&self, record: &StoredArticleRecord) -> Result<TokenizedArticle> {
        let store = self.store.read().await;
        store.load(&record.file_key).ok_or_else(|| {
            Error::repository(
                format!("loading article '{}'", record.file_key),
                std::io::Error::new(std::io::ErrorKind::NotFound, "article not in memory store"),
            )
        })
    }

    async fn delete(&self, record: &StoredArticleRecord) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete(&record.file_key);
        Ok(())
    }

    async fn exists(&self, record: &StoredArticleRecord) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.contains(&record.file_key))
    }
}
