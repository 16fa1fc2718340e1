pub mod wikipedia;

pub use wikipedia::{ClientConfig, WikipediaClient};

/// Common utilities for content sources
pub(crate) mod utils {
    use serde_json::Value;
    use url::Url;
    use wt_core::{Error, Result};

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Config(format!("Failed to parse URL {}: {}", url, e)))
    }

    /// `code: info` from a MediaWiki `error` object, if the body carries one.
    pub fn api_error(body: &Value) -> Option<String> {
        let error = body.get("error")?;
        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let info = error.get("info").and_then(Value::as_str).unwrap_or("no details");
        Some(format!("{}: {}", code, info))
    }
}
