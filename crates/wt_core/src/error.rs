use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error while {context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Parse error while {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Repository error while {context}: {source}")]
    Repository {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }

    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn repository(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Repository {
            context: context.into(),
            source,
        }
    }

    /// True for a repository error caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
