use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One ranked row from a keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub external_id: i64,
}

impl SearchHit {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.external_id > 0
    }
}

/// Article text as returned by the content provider, before tokenization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub content: String,
    pub external_id: i64,
    pub retrieved_at: DateTime<Utc>,
}

impl RawArticle {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedArticle {
    pub article: RawArticle,
    pub tokens: Vec<String>,
    pub tokenized_at: DateTime<Utc>,
}

impl TokenizedArticle {
    pub fn is_valid(&self) -> bool {
        self.article.is_valid() && !self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Index entry for an article persisted as three sibling files sharing
/// the `file_key` stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArticleRecord {
    pub title: String,
    pub file_key: String,
    pub token_count: usize,
    pub saved_at: DateTime<Utc>,
    pub content_path: PathBuf,
    pub tokens_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Result of a fetch that reached the provider.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Available(RawArticle),
    /// The lookup succeeded but the provider had no text for this id.
    Unavailable { external_id: i64 },
}
