//! Core data models used throughout Tavola.
//!
//! These types represent the documents, chunks, and search results that
//! flow through the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::categorize::Category;

/// Raw document produced by the scanner before chunking.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Absolute path on disk (the document's identity).
    pub path: PathBuf,
    /// Path relative to the data directory, used as the source label.
    pub relative_path: String,
    /// File extension including the leading dot (e.g. `.txt`).
    pub extension: String,
    /// Raw text content.
    pub body: String,
    /// Last-modified timestamp at scan time.
    pub modified_at: DateTime<Utc>,
}

/// A retrievable unit of text derived from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Stable identifier: `<relative path>#<chunk index>`.
    pub id: String,
    /// Relative path of the owning document.
    pub source: String,
    /// Category inherited from the owning document.
    pub category: Category,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of the chunk text.
    pub hash: String,
}

/// A chunk plus its embedding, ready to be written to the vector index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A local match returned from the vector index for one query.
#[derive(Debug, Clone, Serialize)]
pub struct LocalResult {
    pub content: String,
    pub source: String,
    #[serde(rename = "type")]
    pub category: Category,
    /// Bounded, higher-is-better score in `[0, 1]`.
    pub relevance_score: f64,
}

/// A web search hit returned by the Brave client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub description: String,
    pub source: Option<String>,
}

/// The sole artifact returned across the query boundary. Local and web
/// results stay in two separate ordered lists; their scoring scales are
/// not comparable and merging them is the caller's decision.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub query: String,
    pub local_results: Vec<LocalResult>,
    pub local_count: usize,
    pub web_results: Vec<WebResult>,
    pub web_count: usize,
}
