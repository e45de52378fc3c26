//! Failure taxonomy for the retrieval engine.
//!
//! Startup-time variants (`SourceUnavailable`, `EmbeddingUnavailable`,
//! `IndexUnavailable`) are fatal: without a data directory, a working
//! embedding model, and an openable index the engine cannot serve any
//! request. `MissingQuery` is rejected per request. `WebSearchFailure` is
//! always absorbed by the retriever and never surfaces to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("data directory not found: {}", .0.display())]
    SourceUnavailable(PathBuf),

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("no query text supplied: pass 'query', 'question', or 'q'")]
    MissingQuery,

    #[error("web search failed: {0}")]
    WebSearchFailure(String),
}
