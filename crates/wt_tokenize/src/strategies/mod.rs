use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use wt_core::{Error, Result};

pub mod basic;
pub mod word;

pub use basic::BasicTokenizer;
pub use word::WordTokenizer;

static ENTITY_PATTERN: Lazy<std::result::Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"&[a-zA-Z]+;"));

static WHITESPACE_PATTERN: Lazy<std::result::Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"\s+"));

/// One rule set for turning text into tokens.
///
/// Implementations are total: any input, including the empty string,
/// produces a (possibly empty) token list.
pub trait TokenizationStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Enum that holds every available strategy
#[derive(Debug, Clone)]
pub enum Strategy {
    Basic(BasicTokenizer),
    Word(WordTokenizer),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Basic(_) => StrategyKind::Basic,
            Strategy::Word(_) => StrategyKind::Word,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Strategy::Basic(s) => s.name(),
            Strategy::Word(s) => s.name(),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            Strategy::Basic(s) => s.tokenize(text),
            Strategy::Word(s) => s.tokenize(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Basic,
    Word,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Basic, StrategyKind::Word];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Basic => "basic",
            StrategyKind::Word => "word",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(StrategyKind::Basic),
            "word" => Ok(StrategyKind::Word),
            other => Err(Error::Validation(format!(
                "Unknown tokenization strategy: {} (expected basic or word)",
                other
            ))),
        }
    }
}

/// Build the strategy for `kind`, compiling its patterns.
pub fn create_strategy(kind: StrategyKind) -> Result<Strategy> {
    let strategy = match kind {
        StrategyKind::Basic => Strategy::Basic(BasicTokenizer::new()?),
        StrategyKind::Word => Strategy::Word(WordTokenizer::new()?),
    };
    tracing::debug!("Tokenization strategy ready: {}", strategy.name());
    Ok(strategy)
}

pub(crate) fn entity_pattern() -> Result<Regex> {
    shared(&ENTITY_PATTERN, "entity")
}

pub(crate) fn whitespace_pattern() -> Result<Regex> {
    shared(&WHITESPACE_PATTERN, "whitespace")
}

pub(crate) fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::Tokenization(format!("Invalid {} pattern: {}", name, e)))
}

fn shared(
    pattern: &Lazy<std::result::Result<Regex, regex::Error>>,
    name: &str,
) -> Result<Regex> {
    Lazy::force(pattern)
        .as_ref()
        .map(Regex::clone)
        .map_err(|e| Error::Tokenization(format!("Invalid {} pattern: {}", name, e)))
}
