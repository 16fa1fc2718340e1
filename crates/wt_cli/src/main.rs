use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wt_fetch::{handle_command, init_logging, ArticlePipeline, ClientConfig, PipelineArgs, PipelineCommands, WikipediaClient};
use wt_storage::{create_repository, StorageConfig, StorageKind};
use wt_tokenize::{StrategyKind, TokenizationService};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

fn add_scaled(total: u64, num: u64, unit_millis: u64) -> std::result::Result<u64, String> {
    num.checked_mul(unit_millis)
        .and_then(|millis| total.checked_add(millis))
        .ok_or_else(|| "Duration is too large".to_string())
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit_millis = match c {
                    'm' if chars.peek() == Some(&'s') => {
                        chars.next();
                        1
                    }
                    's' => 1_000,
                    'm' => 60_000,
                    'h' => 3_600_000,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_millis = add_scaled(total_millis, num, unit_millis)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number is seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_millis = add_scaled(total_millis, num, 1_000)?;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_millis == 0 {
            return Err("Duration must be greater than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "wt", author, version, about = "Fetch, tokenize and store encyclopedia articles", long_about = None)]
struct Cli {
    /// Tokenization strategy: basic or word
    #[arg(long, env = "WT_STRATEGY", default_value = "basic")]
    strategy: StrategyKind,
    /// Storage backend: file or memory
    #[arg(long, env = "WT_STORAGE", default_value = "file")]
    storage: StorageKind,
    /// Directory holding stored articles (defaults to $WT_ARTICLES_DIR or ./articles)
    #[arg(long)]
    articles_dir: Option<PathBuf>,
    /// MediaWiki api.php endpoint (defaults to $WT_API_URL or English Wikipedia)
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    user_agent: Option<String>,
    /// Request timeout (e.g. 30s, 1m, 500ms)
    #[arg(long)]
    timeout: Option<HumanDuration>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: PipelineCommands,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.as_str());
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.as_str());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout.0);
        }
        config
    }

    fn storage_config(&self) -> StorageConfig {
        self.articles_dir
            .as_ref()
            .map(StorageConfig::new)
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = Arc::new(WikipediaClient::new(cli.client_config())?);
    let tokenizer = TokenizationService::with_kind(cli.strategy)?;
    info!("🔤 Tokenizer initialized (using {} strategy)", tokenizer.strategy_name());
    let storage = create_repository(cli.storage, &cli.storage_config()).await?;

    let pipeline = ArticlePipeline::new(source, tokenizer, storage);
    handle_command(PipelineArgs { command: cli.command }, &pipeline).await?;
    Ok(())
}
