//! # Tavola CLI
//!
//! The `tavola` binary is the primary interface for the retrieval
//! engine. It provides commands for rebuilding the vector index,
//! querying from the command line, and starting the HTTP tool server.
//!
//! ## Usage
//!
//! ```bash
//! tavola --config ./tavola.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tavola ingest` | Rebuild the vector index from the data directory |
//! | `tavola search "<query>"` | Query the index (add `--web` for hybrid) |
//! | `tavola serve` | Rebuild, then start the MCP-style tool server |
//!
//! The data directory defaults to `data/` and can be overridden either
//! in the config file or with the `RESTAURANT_DATA_DIR` environment
//! variable. `serve` always rebuilds the index first, so the persisted
//! index reflects exactly the files present at startup.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use tavola::config;
use tavola::embedding;
use tavola::index::VectorIndex;
use tavola::ingest;
use tavola::retrieve::{HybridRetriever, RagRequest};
use tavola::server;
use tavola::websearch::WebSearchClient;

/// Tavola — hybrid local + web retrieval over restaurant knowledge.
#[derive(Parser)]
#[command(
    name = "tavola",
    about = "Tavola — a hybrid retrieval engine for restaurant knowledge",
    version,
    long_about = "Tavola ingests a directory of text documents into a persistent \
    vector index and answers natural-language questions by combining local semantic \
    search with an optional Brave web search, exposed as MCP-style HTTP tools."
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./tavola.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the data directory.
    ///
    /// Scans the data directory, categorizes and chunks every text
    /// file, embeds all chunks, and atomically replaces the persisted
    /// index. Files removed since the last run disappear from results.
    Ingest,

    /// Query the index from the command line.
    Search {
        /// The question to ask.
        query: String,

        /// Maximum number of local results.
        #[arg(long)]
        top_k: Option<i64>,

        /// Also run a Brave web search (requires BRAVE_API_KEY).
        #[arg(long)]
        web: bool,

        /// Maximum number of web results.
        #[arg(long)]
        web_count: Option<i64>,
    },

    /// Rebuild the index, then start the HTTP tool server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    // One provider and one index handle for the whole process; the
    // ingestion and query paths must embed with the same model.
    let provider = embedding::create_provider(&cfg.embedding)?;
    let index = Arc::new(VectorIndex::open(&cfg).await?);

    match cli.command {
        Commands::Ingest => {
            let report = ingest::rebuild_index(&cfg, provider.as_ref(), &index).await?;
            println!("ingest");
            println!("  documents: {}", report.documents);
            println!("  chunks indexed: {}", report.chunks);
            println!("  generation: {}", report.generation);
            println!("ok");
        }
        Commands::Search {
            query,
            top_k,
            web,
            web_count,
        } => {
            let mut params = serde_json::json!({ "query": query, "include_web_search": web });
            if let Some(k) = top_k {
                params["top_k"] = serde_json::json!(k);
            }
            if let Some(n) = web_count {
                params["web_results_count"] = serde_json::json!(n);
            }
            let request = RagRequest::from_params(&params, &cfg.retrieval, &cfg.web_search)?;

            let retriever = HybridRetriever::new(
                index,
                provider,
                WebSearchClient::from_config(&cfg.web_search)?,
                cfg.retrieval.clone(),
            );
            let response = retriever.retrieve(&request).await?;
            print_response(&response);
        }
        Commands::Serve => {
            // Unconditional rebuild on startup: the served index always
            // reflects the current file-system content.
            let report = ingest::rebuild_index(&cfg, provider.as_ref(), &index).await?;
            println!(
                "indexed {} chunks from {} documents (generation {})",
                report.chunks, report.documents, report.generation
            );

            let retriever = Arc::new(HybridRetriever::new(
                index,
                provider,
                WebSearchClient::from_config(&cfg.web_search)?,
                cfg.retrieval.clone(),
            ));
            server::run_server(Arc::new(cfg), retriever).await?;
        }
    }

    Ok(())
}

fn print_response(response: &tavola::models::RetrievalResponse) {
    if response.local_results.is_empty() {
        println!("No local results.");
    }
    for (i, result) in response.local_results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} ({})",
            i + 1,
            result.relevance_score,
            result.source,
            result.category
        );
        println!("    \"{}\"", result.content.replace('\n', " ").trim());
        println!();
    }

    if !response.web_results.is_empty() {
        println!("Web results:");
        for (i, result) in response.web_results.iter().enumerate() {
            println!("{}. {}", i + 1, result.title);
            println!("    url: {}", result.url);
            if let Some(ref source) = result.source {
                println!("    source: {source}");
            }
            if !result.description.is_empty() {
                println!("    \"{}\"", result.description);
            }
            println!();
        }
    }
}
