pub mod cli;
pub mod logging;
pub mod manager;
pub mod sources;

pub use cli::{handle_command, PipelineArgs, PipelineCommands};
pub use logging::init_logging;
pub use manager::{ArticlePipeline, DownloadOutcome};
pub use sources::{ClientConfig, WikipediaClient};

pub mod prelude {
    pub use super::manager::{ArticlePipeline, DownloadOutcome};
    pub use super::sources::{ClientConfig, WikipediaClient};
    pub use wt_core::{ContentSource, Error, FetchOutcome, RawArticle, Result, SearchHit};
}
