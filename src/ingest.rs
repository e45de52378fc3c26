//! Startup rebuild pipeline.
//!
//! Orchestrates scanner → categorizer → chunker → embedding provider →
//! vector index. The pipeline is all-or-nothing: every chunk is embedded
//! before `rebuild` is invoked once with the complete collection, so an
//! embedding failure partway commits nothing and the previous index
//! generation keeps serving. Files removed from the data directory
//! disappear from the index on the next run; there is no incremental
//! diffing.

use anyhow::Result;
use tracing::info;

use crate::categorize::categorize;
use crate::chunk::chunk_document;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::models::IndexEntry;
use crate::scan::scan_documents;

/// Summary of one rebuild, printed by the CLI.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub generation: i64,
}

/// Rebuild the vector index from the data directory.
pub async fn rebuild_index(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    index: &VectorIndex,
) -> Result<IngestReport> {
    let documents = scan_documents(config)?;
    info!(documents = documents.len(), dir = %config.data_dir().display(), "scanned data directory");

    let mut chunks = Vec::new();
    for doc in &documents {
        let file_name = doc
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| doc.relative_path.clone());
        let category = categorize(&file_name);
        chunks.extend(chunk_document(doc, category, config.chunking.max_chars));
    }

    // Embed everything before touching the index.
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.embedding.batch_size.max(1)) {
        embeddings.extend(provider.embed(batch).await?);
    }

    if embeddings.len() != chunks.len() {
        anyhow::bail!(
            "embedding count mismatch: {} chunks, {} vectors",
            chunks.len(),
            embeddings.len()
        );
    }

    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
        .collect();

    let generation = index.rebuild(&entries, provider.model_name()).await?;
    info!(
        generation,
        entries = entries.len(),
        model = provider.model_name(),
        "index rebuilt"
    );

    Ok(IngestReport {
        documents: documents.len(),
        chunks: entries.len(),
        generation,
    })
}
