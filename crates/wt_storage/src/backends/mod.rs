pub mod file;
pub mod memory;

pub use file::{file_key, sanitize_title, ArticleMetadata, FilePaths, FileStorage};
pub use memory::MemoryStorage;
