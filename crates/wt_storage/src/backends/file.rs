//! Flat-file article store.
//!
//! Every article is kept as three siblings sharing one key stem:
//! `<key>.txt` (raw content), `<key>_tokens.json` (token array) and
//! `<key>_metadata.json` (the index entry). Listing is driven by the
//! metadata files; an article without one does not exist as far as
//! [`FileStorage::get_all`] is concerned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::{fs, task};
use tracing::{debug, info, warn};
use wt_core::{ArticleRepository, Error, RawArticle, Result, StoredArticleRecord, TokenizedArticle};

use crate::{StorageBackend, StorageConfig};

const CONTENT_SUFFIX: &str = ".txt";
const TOKENS_SUFFIX: &str = "_tokens.json";
const METADATA_SUFFIX: &str = "_metadata.json";
// leaves room for the timestamp, a collision suffix, the longest file
// suffix and the temp-file decoration inside a 255-byte file name
const MAX_TITLE_BYTES: usize = 180;
const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Serialized form of the metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub title: String,
    pub article_path: PathBuf,
    pub tokens_path: PathBuf,
    pub token_count: usize,
    pub saved_date: DateTime<Utc>,
    pub content_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePaths {
    pub content: PathBuf,
    pub tokens: PathBuf,
    pub metadata: PathBuf,
}

impl FilePaths {
    pub fn new(root: &Path, key: &str) -> Self {
        Self {
            content: root.join(format!("{}{}", key, CONTENT_SUFFIX)),
            tokens: root.join(format!("{}{}", key, TOKENS_SUFFIX)),
            metadata: root.join(format!("{}{}", key, METADATA_SUFFIX)),
        }
    }

    fn all(&self) -> [&Path; 3] {
        [&self.content, &self.tokens, &self.metadata]
    }

    pub async fn all_exist(&self) -> io::Result<bool> {
        for path in self.all() {
            if !fs::try_exists(path).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn any_exist(&self) -> io::Result<bool> {
        for path in self.all() {
            if fs::try_exists(path).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Replace characters that are not allowed in file names on common
/// platforms and cap the UTF-8 length at [`MAX_TITLE_BYTES`].
pub fn sanitize_title(title: &str) -> String {
    let mut sanitized = String::new();
    for c in title.trim().chars() {
        let c = match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        if sanitized.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        sanitized.push(c);
    }
    sanitized
}

pub fn file_key(title: &str, saved_at: DateTime<Utc>) -> String {
    format!("{}_{}", sanitize_title(title), saved_at.format(KEY_TIMESTAMP_FORMAT))
}

/// Write to a uniquely named hidden sibling, then rename into place.
/// The temporary file is removed on any failure.
async fn write_atomic(path: &Path, contents: Vec<u8>) -> io::Result<()> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || -> io::Result<()> {
        let dir = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{} has no parent", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&contents)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let dir = &config.articles_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::repository(format!("creating articles directory {}", dir.display()), e))?;
        let root = fs::canonicalize(dir)
            .await
            .map_err(|e| Error::repository(format!("resolving articles directory {}", dir.display()), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths_for(&self, file_key: &str) -> Result<FilePaths> {
        if file_key.is_empty()
            || file_key.contains(|c| c == '/' || c == '\\')
            || file_key == "."
            || file_key == ".."
        {
            return Err(Error::Validation(format!("Invalid article key: {:?}", file_key)));
        }
        Ok(FilePaths::new(&self.root, file_key))
    }

    /// Claim the first free key for this title and second. The claim is an
    /// empty content file created with `create_new`, so two saves can never
    /// hold the same key; a numeric suffix separates saves that land in the
    /// same second.
    async fn reserve_key(&self, title: &str, saved_at: DateTime<Utc>) -> io::Result<(String, FilePaths)> {
        let base = file_key(title, saved_at);
        let mut n = 1;
        loop {
            let key = if n == 1 { base.clone() } else { format!("{}-{}", base, n) };
            let paths = FilePaths::new(&self.root, &key);
            if !paths.any_exist().await? {
                match fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&paths.content)
                    .await
                {
                    Ok(_) => return Ok((key, paths)),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(e),
                }
            }
            n += 1;
        }
    }

    /// Content and tokens go first so that a visible metadata file always
    /// points at complete siblings. Every path this call writes is pushed
    /// onto `written`.
    async fn publish(
        &self,
        paths: &FilePaths,
        article: &TokenizedArticle,
        metadata: &ArticleMetadata,
        written: &mut Vec<PathBuf>,
    ) -> io::Result<()> {
        write_atomic(&paths.content, article.article.content.clone().into_bytes()).await?;
        let tokens = serde_json::to_vec_pretty(&article.tokens)?;
        write_atomic(&paths.tokens, tokens).await?;
        written.push(paths.tokens.clone());
        let metadata = serde_json::to_vec_pretty(metadata)?;
        write_atomic(&paths.metadata, metadata).await?;
        written.push(paths.metadata.clone());
        Ok(())
    }

    /// Remove the files a failed save created, and nothing else.
    async fn rollback(&self, written: &[PathBuf]) {
        for path in written.iter().rev() {
            if let Err(e) = remove_if_exists(path).await {
                warn!("Failed to clean up {} after a failed save: {}", path.display(), e);
            }
        }
    }

    async fn read_record(&self, metadata_path: PathBuf, file_key: String) -> Option<StoredArticleRecord> {
        let json = match fs::read_to_string(&metadata_path).await {
            Ok(json) => json,
            Err(e) => {
                warn!("Skipping unreadable metadata {}: {}", metadata_path.display(), e);
                return None;
            }
        };
        let metadata: ArticleMetadata = match serde_json::from_str(&json) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping malformed metadata {}: {}", metadata_path.display(), e);
                return None;
            }
        };
        if !fs::try_exists(&metadata.article_path).await.unwrap_or(false) {
            debug!(
                "Skipping {}: content file {} is missing",
                file_key,
                metadata.article_path.display()
            );
            return None;
        }

        Some(StoredArticleRecord {
            title: metadata.title,
            file_key,
            token_count: metadata.token_count,
            saved_at: metadata.saved_date,
            content_path: metadata.article_path,
            tokens_path: metadata.tokens_path,
            metadata_path,
        })
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    fn backend_name() -> &'static str {
        "file"
    }

    async fn open(config: &StorageConfig) -> Result<Self> {
        Self::new(config).await
    }
}

#[async_trait]
impl ArticleRepository for FileStorage {
    async fn save(&self, article: &TokenizedArticle) -> Result<StoredArticleRecord> {
        if !article.is_valid() {
            return Err(Error::Validation(
                "Cannot save an article without title, content and tokens".to_string(),
            ));
        }

        let title = &article.article.title;
        let context = format!("saving article '{}'", title);
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::repository(context.clone(), e))?;

        let saved_at = Utc::now();
        let (key, paths) = self
            .reserve_key(title, saved_at)
            .await
            .map_err(|e| Error::repository(context.clone(), e))?;
        let metadata = ArticleMetadata {
            title: title.clone(),
            article_path: paths.content.clone(),
            tokens_path: paths.tokens.clone(),
            token_count: article.token_count(),
            saved_date: saved_at,
            content_length: article.article.char_count(),
        };

        // the reserved content file belongs to this save from here on
        let mut written = vec![paths.content.clone()];
        if let Err(e) = self.publish(&paths, article, &metadata, &mut written).await {
            self.rollback(&written).await;
            return Err(Error::repository(context, e));
        }

        info!("💾 Saved '{}' as {} ({} tokens)", title, key, metadata.token_count);
        Ok(StoredArticleRecord {
            title: metadata.title,
            file_key: key,
            token_count: metadata.token_count,
            saved_at,
            content_path: paths.content,
            tokens_path: paths.tokens,
            metadata_path: paths.metadata,
        })
    }

    async fn get_all(&self) -> Result<Vec<StoredArticleRecord>> {
        let context = "listing stored articles";
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::repository(context, e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::repository(context, e))?
        {
            let path = entry.path();
            let key = match path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(METADATA_SUFFIX))
            {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => continue,
            };
            if let Some(record) = self.read_record(path, key).await {
                records.push(record);
            }
        }

        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(records)
    }

    async fn load(&self, record: &StoredArticleRecord) -> Result<TokenizedArticle> {
        let paths = self.paths_for(&record.file_key)?;
        let context = format!("loading article '{}'", record.file_key);

        let complete = paths
            .all_exist()
            .await
            .map_err(|e| Error::repository(context.clone(), e))?;
        if !complete {
            return Err(Error::repository(
                context,
                io::Error::new(io::ErrorKind::NotFound, "article files not found"),
            ));
        }

        let content = fs::read_to_string(&paths.content)
            .await
            .map_err(|e| Error::repository(context.clone(), e))?;
        let tokens_json = fs::read_to_string(&paths.tokens)
            .await
            .map_err(|e| Error::repository(context.clone(), e))?;
        let tokens: Vec<String> = serde_json::from_str(&tokens_json)
            .map_err(|e| Error::repository(context, e.into()))?;

        Ok(TokenizedArticle {
            article: RawArticle {
                title: record.title.clone(),
                content,
                external_id: 0,
                retrieved_at: record.saved_at,
            },
            tokens,
            tokenized_at: record.saved_at,
        })
    }

    async fn delete(&self, record: &StoredArticleRecord) -> Result<()> {
        let paths = self.paths_for(&record.file_key)?;
        for path in paths.all() {
            remove_if_exists(path)
                .await
                .map_err(|e| Error::repository(format!("deleting article '{}'", record.file_key), e))?;
        }
        info!("🗑️ Deleted {}", record.file_key);
        Ok(())
    }

    async fn exists(&self, record: &StoredArticleRecord) -> Result<bool> {
        let paths = self.paths_for(&record.file_key)?;
        paths
            .all_exist()
            .await
            .map_err(|e| Error::repository(format!("checking article '{}'", record.file_key), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn tokenized(title: &str, content: &str, tokens: &[&str]) -> TokenizedArticle {
        TokenizedArticle {
            article: RawArticle {
                title: title.to_string(),
                content: content.to_string(),
                external_id: 123,
                retrieved_at: Utc::now(),
            },
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            tokenized_at: Utc::now(),
        }
    }

    async fn storage() -> (FileStorage, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(&StorageConfig::new(dir.path())).await.unwrap();
        (storage, dir)
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("AC/DC: Live?"), "AC_DC_ Live_");
        assert_eq!(sanitize_title("a<b>c|d*e\"f\\g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_title("tab\there"), "tab_here");
        assert_eq!(sanitize_title(&"x".repeat(300)).len(), MAX_TITLE_BYTES);
    }

    #[test]
    fn test_sanitize_title_caps_bytes_on_char_boundary() {
        let title = sanitize_title(&"猫".repeat(100));
        assert!(title.len() <= MAX_TITLE_BYTES);
        assert_eq!(title.chars().count(), MAX_TITLE_BYTES / 3);
        assert!(title.chars().all(|c| c == '猫'));

        let mixed = sanitize_title(&format!("a{}", "é".repeat(200)));
        assert!(mixed.len() <= MAX_TITLE_BYTES);
        assert!(mixed.starts_with('a'));
    }

    #[test]
    fn test_file_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(file_key("Cat", at), "Cat_20240309_070501");
    }

    #[tokio::test]
    async fn test_save_writes_three_files() {
        let (storage, _dir) = storage().await;
        let record = storage
            .save(&tokenized("Cat", "Cats are animals.", &["cats", "are", "animals"]))
            .await
            .unwrap();

        assert!(record.file_key.starts_with("Cat_"));
        assert_eq!(record.token_count, 3);
        assert_eq!(
            std::fs::read_to_string(&record.content_path).unwrap(),
            "Cats are animals."
        );
        let tokens: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&record.tokens_path).unwrap()).unwrap();
        assert_eq!(tokens, vec!["cats", "are", "animals"]);

        let metadata: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&record.metadata_path).unwrap()).unwrap();
        assert_eq!(metadata["title"], "Cat");
        assert_eq!(metadata["tokenCount"], 3);
        assert_eq!(metadata["contentLength"], 17);
        assert!(metadata["savedDate"].is_string());
        assert_eq!(
            metadata["articlePath"].as_str().unwrap(),
            record.content_path.to_str().unwrap()
        );
        assert!(metadata.get("fileKey").is_none());
        assert!(storage.exists(&record).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_article() {
        let (storage, dir) = storage().await;
        let err = storage.save(&tokenized("Cat", "Cats", &[])).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_load_round_trip() {
        let (storage, _dir) = storage().await;
        let original = tokenized("Dog", "Dogs bark.\nLoudly.", &["dogs", "bark", "loudly"]);
        let record = storage.save(&original).await.unwrap();

        let loaded = storage.load(&record).await.unwrap();
        assert_eq!(loaded.article.content, original.article.content);
        assert_eq!(loaded.article.title, "Dog");
        assert_eq!(loaded.tokens, original.tokens);
        assert_eq!(loaded.tokenized_at, record.saved_at);
    }

    #[tokio::test]
    async fn test_same_title_same_second_gets_distinct_keys() {
        let (storage, _dir) = storage().await;
        let article = tokenized("Cat", "Cats are animals.", &["cats"]);
        let first = storage.save(&article).await.unwrap();
        let second = storage.save(&article).await.unwrap();
        assert_ne!(first.file_key, second.file_key);
        assert_eq!(storage.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_long_multibyte_title_round_trips() {
        let (storage, _dir) = storage().await;
        let title = "猫".repeat(100);
        let record = storage
            .save(&tokenized(&title, "猫は動物です", &["猫は動物です"]))
            .await
            .unwrap();

        assert_eq!(record.title, title);
        let loaded = storage.load(&record).await.unwrap();
        assert_eq!(loaded.article.content, "猫は動物です");
        assert_eq!(storage.get_all().await.unwrap(), vec![record]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_never_collide() {
        let (storage, _dir) = storage().await;
        let storage = std::sync::Arc::new(storage);

        let handles = (0..8)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let content = format!("Cats are animals {}", i);
                    storage.save(&tokenized("Cat", &content, &["cats"])).await
                })
            })
            .collect::<Vec<_>>();

        let mut records = Vec::new();
        for handle in handles {
            records.push(handle.await.unwrap().unwrap());
        }

        let mut keys: Vec<&str> = records.iter().map(|r| r.file_key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 8);
        assert_eq!(storage.get_all().await.unwrap().len(), 8);
        for record in &records {
            let loaded = storage.load(record).await.unwrap();
            assert!(loaded.article.content.starts_with("Cats are animals"));
        }

        // no temporary files are left behind
        let leftovers = std::fs::read_dir(storage.root())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_get_all_orders_newest_first() {
        let (storage, _dir) = storage().await;
        let older = storage.save(&tokenized("Older", "one two", &["one", "two"])).await.unwrap();

        // Backdate the first record so ordering does not depend on timing
        let mut metadata: ArticleMetadata =
            serde_json::from_str(&std::fs::read_to_string(&older.metadata_path).unwrap()).unwrap();
        metadata.saved_date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        std::fs::write(&older.metadata_path, serde_json::to_string(&metadata).unwrap()).unwrap();

        storage.save(&tokenized("Newer", "three four", &["three", "four"])).await.unwrap();

        let titles: Vec<String> = storage
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_get_all_skips_missing_content_and_bad_metadata() {
        let (storage, dir) = storage().await;
        let kept = storage.save(&tokenized("Kept", "kept text", &["kept", "text"])).await.unwrap();

        let orphan = ArticleMetadata {
            title: "Orphan".to_string(),
            article_path: dir.path().join("nowhere.txt"),
            tokens_path: dir.path().join("nowhere_tokens.json"),
            token_count: 1,
            saved_date: Utc::now(),
            content_length: 4,
        };
        std::fs::write(
            dir.path().join("Orphan_20240101_000000_metadata.json"),
            serde_json::to_string(&orphan).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("Broken_20240101_000000_metadata.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("Stray_20240101_000000.txt"), "no metadata").unwrap();

        let records = storage.get_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_key, kept.file_key);
    }

    #[tokio::test]
    async fn test_get_all_missing_directory_is_empty() {
        let (storage, dir) = storage().await;
        drop(dir);
        assert!(storage.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let (storage, _dir) = storage().await;
        let record = storage.save(&tokenized("Cat", "Cats", &["cats"])).await.unwrap();
        std::fs::remove_file(&record.tokens_path).unwrap();

        let err = storage.load(&record).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!storage.exists(&record).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_best_effort() {
        let (storage, _dir) = storage().await;
        let record = storage.save(&tokenized("Cat", "Cats", &["cats"])).await.unwrap();
        std::fs::remove_file(&record.content_path).unwrap();

        storage.delete(&record).await.unwrap();
        assert!(!storage.exists(&record).await.unwrap());
        assert!(!record.metadata_path.exists());
        assert!(storage.get_all().await.unwrap().is_empty());

        // deleting again is fine
        storage.delete(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_key() {
        let (storage, _dir) = storage().await;
        let record = storage.save(&tokenized("Cat", "Cats", &["cats"])).await.unwrap();
        assert_eq!(storage.find(&record.file_key).await.unwrap(), Some(record));
        assert_eq!(storage.find("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_keys_with_separators() {
        let (storage, _dir) = storage().await;
        let mut record = storage.save(&tokenized("Cat", "Cats", &["cats"])).await.unwrap();
        record.file_key = "../escape".to_string();
        assert!(matches!(storage.exists(&record).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_publish_is_rolled_back() {
        let (storage, _dir) = storage().await;
        let article = tokenized("Cat", "Cats", &["cats"]);
        let (_key, paths) = storage.reserve_key("Cat", Utc::now()).await.unwrap();
        let metadata = ArticleMetadata {
            title: "Cat".to_string(),
            article_path: paths.content.clone(),
            tokens_path: paths.tokens.clone(),
            token_count: 1,
            saved_date: Utc::now(),
            content_length: 4,
        };
        // a directory squatting on the metadata name makes the last write fail
        std::fs::create_dir(&paths.metadata).unwrap();

        let mut written = vec![paths.content.clone()];
        assert!(storage.publish(&paths, &article, &metadata, &mut written).await.is_err());
        assert_eq!(written, vec![paths.content.clone(), paths.tokens.clone()]);
        assert!(paths.content.exists());

        storage.rollback(&written).await;
        assert!(!paths.content.exists());
        assert!(!paths.tokens.exists());
        // not created by this save, so left alone
        assert!(paths.metadata.is_dir());
        assert!(storage.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_key_is_skipped() {
        let (storage, _dir) = storage().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let (first, _) = storage.reserve_key("Cat", at).await.unwrap();
        let (second, _) = storage.reserve_key("Cat", at).await.unwrap();
        assert_eq!(first, "Cat_20240309_070501");
        assert_eq!(second, "Cat_20240309_070501-2");
    }
}
