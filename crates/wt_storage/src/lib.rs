use async_trait::async_trait;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use wt_core::{ArticleRepository, Error, Result};

pub mod backends;

pub use backends::*;

pub const DEFAULT_ARTICLES_DIR: &str = "articles";

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn backend_name() -> &'static str;
    async fn open(config: &StorageConfig) -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub articles_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(articles_dir: impl Into<PathBuf>) -> Self {
        Self {
            articles_dir: articles_dir.into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = env::var("WT_ARTICLES_DIR").unwrap_or_else(|_| DEFAULT_ARTICLES_DIR.to_string());
        Self::new(dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    File,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::File => f.write_str("file"),
            StorageKind::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            other => Err(Error::Validation(format!(
                "Unknown storage backend: {} (expected file or memory)",
                other
            ))),
        }
    }
}

async fn open<T: StorageBackend + ArticleRepository + 'static>(
    config: &StorageConfig,
) -> Result<Arc<dyn ArticleRepository>> {
    let storage = T::open(config).await?;
    tracing::info!("💾 Storage backend ready (using {})", T::backend_name());
    Ok(Arc::new(storage))
}

pub async fn create_repository(
    kind: StorageKind,
    config: &StorageConfig,
) -> Result<Arc<dyn ArticleRepository>> {
    match kind {
        StorageKind::File => open::<FileStorage>(config).await,
        StorageKind::Memory => open::<MemoryStorage>(config).await,
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_repository, StorageConfig, StorageKind};
}
