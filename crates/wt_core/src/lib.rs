pub mod error;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use source::ContentSource;
pub use storage::ArticleRepository;
pub use types::{FetchOutcome, RawArticle, SearchHit, StoredArticleRecord, TokenizedArticle};
