use clap::{Args, Subcommand};
use std::io;
use wt_core::{Error, Result, SearchHit, StoredArticleRecord};
use wt_tokenize::StrategyKind;

use crate::manager::{ArticlePipeline, DownloadOutcome};
use crate::sources::wikipedia::DEFAULT_SEARCH_LIMIT;

pub const TOKEN_PREVIEW_LIMIT: usize = 500;

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PipelineCommands {
    /// Search the encyclopedia for articles matching a query
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Fetch an article by page id, tokenize it and store it
    Download {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List stored articles, newest first
    List,
    /// Print a stored article's tokens
    Show {
        key: String,
        #[arg(long, default_value_t = TOKEN_PREVIEW_LIMIT)]
        max_tokens: usize,
    },
    /// Delete a stored article
    Delete { key: String },
    /// Tokenize text with the selected strategy without storing anything
    Tokenize {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List available tokenization strategies
    Strategies,
}

pub async fn handle_command(args: PipelineArgs, pipeline: &ArticlePipeline) -> Result<()> {
    match args.command {
        PipelineCommands::Search { query, limit } => {
            let hits = pipeline.search(&query.join(" "), limit).await?;
            println!("{}", format_hits(&hits));
        }
        PipelineCommands::Download { id } => match pipeline.download(id).await? {
            DownloadOutcome::Stored { record, article } => {
                println!("🆕 {} saved as {}", record.title, record.file_key);
                println!("{}", format_tokens(&article.tokens, TOKEN_PREVIEW_LIMIT));
            }
            DownloadOutcome::Unavailable { external_id } => {
                println!("⏭️ No content available for page {}", external_id);
            }
        },
        PipelineCommands::List => {
            let records = pipeline.list().await?;
            println!("{}", format_records(&records));
        }
        PipelineCommands::Show { key, max_tokens } => {
            let record = find_record(pipeline, &key).await?;
            let article = pipeline.load(&record).await?;
            println!("📰 {} (saved {})", record.title, record.saved_at.to_rfc3339());
            println!("{}", format_tokens(&article.tokens, max_tokens));
        }
        PipelineCommands::Delete { key } => {
            let record = find_record(pipeline, &key).await?;
            pipeline.delete(&record).await?;
            println!("🗑️ Deleted {}", record.file_key);
        }
        PipelineCommands::Tokenize { text } => {
            let tokens = pipeline.tokenizer().tokenize_text(&text.join(" "));
            println!("{}", format_tokens(&tokens, TOKEN_PREVIEW_LIMIT));
        }
        PipelineCommands::Strategies => {
            println!("Available strategies:");
            let active = pipeline.tokenizer().kind();
            for kind in StrategyKind::ALL {
                let marker = if kind == active { "*" } else { " " };
                println!(" {} {}", marker, kind);
            }
        }
    }
    Ok(())
}

async fn find_record(pipeline: &ArticlePipeline, key: &str) -> Result<StoredArticleRecord> {
    pipeline.find(key).await?.ok_or_else(|| {
        Error::repository(
            format!("looking up article '{}'", key),
            io::Error::new(io::ErrorKind::NotFound, "no stored article with this key"),
        )
    })
}

pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }
    let mut out = format!("Found {} result(s).", hits.len());
    for hit in hits {
        out.push_str(&format!("\n[{}] {}", hit.external_id, hit.title));
        if !hit.snippet.is_empty() {
            out.push_str(&format!("\n    {}", hit.snippet));
        }
    }
    out
}

pub fn format_records(records: &[StoredArticleRecord]) -> String {
    if records.is_empty() {
        return "No stored articles.".to_string();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "{}  {}  {} tokens  {}",
                r.saved_at.format("%Y-%m-%d %H:%M:%S"),
                r.file_key,
                r.token_count,
                r.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_tokens(tokens: &[String], max: usize) -> String {
    let shown = tokens.iter().take(max).map(String::as_str).collect::<Vec<_>>();
    format!(
        "Total tokens: {}\n\nTokens (first {}):\n{}",
        tokens.len(),
        max,
        shown.join(" | ")
    )
}
