use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use wt_core::{ContentSource, Error, FetchOutcome, RawArticle, Result, SearchHit};

use super::utils;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "wikitok/0.1 (educational tokenizer)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

// srlimit ceiling for anonymous clients
const MAX_SEARCH_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api_url = env::var("WT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let user_agent = env::var("WT_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let timeout = env::var("WT_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            api_url,
            user_agent,
            timeout: Duration::from_secs(timeout),
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Deserialize)]
struct SearchRow {
    title: String,
    #[serde(default)]
    snippet: String,
    pageid: i64,
}

#[derive(Deserialize)]
struct PageRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

/// Client for the MediaWiki action API (`api.php`).
pub struct WikipediaClient {
    client: Client,
    api_url: Url,
}

impl WikipediaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api_url = utils::parse_url(&config.api_url)?;
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, api_url })
    }

    fn search_url(&self, query: &str, limit: usize) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query)
            .append_pair("format", "json")
            .append_pair("srlimit", &limit.to_string());
        url
    }

    fn article_url(&self, external_id: i64) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("prop", "extracts")
            .append_pair("exintro", "false")
            .append_pair("explaintext", "true")
            .append_pair("pageids", &external_id.to_string())
            .append_pair("format", "json");
        url
    }

    async fn get_json(&self, url: Url, context: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::network(context, e))?;
        let body = response.text().await.map_err(|e| Error::network(context, e))?;
        serde_json::from_str(&body).map_err(|e| Error::parse(context, e))
    }
}

impl fmt::Debug for WikipediaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WikipediaClient")
            .field("client", &"<reqwest::Client>")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

/// Decode `query.search[]`. Rows that do not decode, or decode into an
/// invalid hit, are dropped; the rest keep the provider's order.
pub(crate) fn parse_search_results(body: &Value, context: &str) -> Result<Vec<SearchHit>> {
    if !body.is_object() {
        return Err(Error::parse(context, "expected a JSON object"));
    }
    if let Some(message) = utils::api_error(body) {
        return Err(Error::parse(context, format!("API error {}", message)));
    }

    let rows = match body.get("query").and_then(|query| query.get("search")) {
        None => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(_) => return Err(Error::parse(context, "query.search is not an array")),
    };

    Ok(rows
        .iter()
        .filter_map(|row| match SearchRow::deserialize(row) {
            Ok(row) => Some(SearchHit {
                title: row.title,
                snippet: row.snippet,
                external_id: row.pageid,
            }),
            Err(e) => {
                debug!("Skipping malformed search row: {}", e);
                None
            }
        })
        .filter(|hit| {
            let valid = hit.is_valid();
            if !valid {
                debug!("Skipping invalid search hit: {:?}", hit);
            }
            valid
        })
        .collect())
}

/// Decode `query.pages.<id>`; falls back to the first page when the id key
/// is absent.
pub(crate) fn parse_article(body: &Value, external_id: i64, context: &str) -> Result<FetchOutcome> {
    if !body.is_object() {
        return Err(Error::parse(context, "expected a JSON object"));
    }
    if let Some(message) = utils::api_error(body) {
        return Err(Error::parse(context, format!("API error {}", message)));
    }

    let page = match body.get("query").and_then(|query| query.get("pages")) {
        None => None,
        Some(Value::Object(pages)) => pages
            .get(&external_id.to_string())
            .or_else(|| pages.values().next()),
        Some(_) => return Err(Error::parse(context, "query.pages is not an object")),
    };

    let page = match page {
        Some(page) => PageRow::deserialize(page).map_err(|e| Error::parse(context, e))?,
        None => return Ok(FetchOutcome::Unavailable { external_id }),
    };

    match page.extract {
        Some(content) if !content.trim().is_empty() => Ok(FetchOutcome::Available(RawArticle {
            title: page.title,
            content,
            external_id,
            retrieved_at: Utc::now(),
        })),
        _ => Ok(FetchOutcome::Unavailable { external_id }),
    }
}

#[async_trait]
impl ContentSource for WikipediaClient {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Search query cannot be empty".to_string()));
        }
        if limit == 0 {
            return Err(Error::Validation("Search limit must be greater than zero".to_string()));
        }

        info!("🔍 Searching {} for '{}'", self.name(), query);
        let context = format!("searching for '{}'", query);
        let body = self
            .get_json(self.search_url(query, limit.min(MAX_SEARCH_LIMIT)), &context)
            .await?;
        let hits = parse_search_results(&body, &context)?;
        info!("✨ Found {} results for '{}'", hits.len(), query);
        Ok(hits)
    }

    async fn fetch(&self, external_id: i64) -> Result<FetchOutcome> {
        if external_id <= 0 {
            return Err(Error::Validation(format!(
                "Page id must be greater than zero, got {}",
                external_id
            )));
        }

        info!("📰 Fetching article {} from {}", external_id, self.name());
        let context = format!("fetching article {}", external_id);
        let body = self.get_json(self.article_url(external_id), &context).await?;
        parse_article(&body, external_id, &context)
    }
}
