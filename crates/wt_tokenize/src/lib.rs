pub mod service;
pub mod strategies;

pub use service::TokenizationService;
pub use strategies::{create_strategy, Strategy, StrategyKind, TokenizationStrategy};

pub mod prelude {
    pub use super::service::TokenizationService;
    pub use super::strategies::{create_strategy, Strategy, StrategyKind, TokenizationStrategy};
    pub use wt_core::{Error, RawArticle, Result, TokenizedArticle};
}
