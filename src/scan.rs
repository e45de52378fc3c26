//! Data-directory document scanner.
//!
//! Walks the configured data directory and produces a [`SourceDocument`]
//! for every file with an accepted text extension. The index's own
//! persistence directory is always skipped so a rebuild never indexes
//! the database files it is writing.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::EngineError;
use crate::models::SourceDocument;

/// Scan the data directory for eligible text files.
///
/// Fails with [`EngineError::SourceUnavailable`] only when the directory
/// itself does not exist. An empty directory yields an empty vector so
/// ingestion can proceed with zero entries.
pub fn scan_documents(config: &Config) -> Result<Vec<SourceDocument>> {
    let root = config.data_dir();
    if !root.is_dir() {
        return Err(EngineError::SourceUnavailable(root).into());
    }

    let exclude_set = build_globset(&config.data.exclude_globs)?;
    let index_dir = config.db_path().parent().map(|p| p.to_path_buf());

    let mut documents = Vec::new();

    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();

        // Never index the vector index's own files.
        if let Some(ref idx) = index_dir {
            if path.starts_with(idx) {
                continue;
            }
        }

        let relative = path.strip_prefix(&root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        let Some(extension) = dotted_extension(path) else {
            continue;
        };
        if !config
            .data
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&extension))
        {
            continue;
        }

        // A file that cannot be read as text (permissions, invalid
        // UTF-8) is skipped rather than indexed as empty content.
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        documents.push(file_to_document(path, &rel_str, &extension, body)?);
    }

    // Sort for deterministic ordering across runs.
    documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(documents)
}

fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}

fn file_to_document(
    path: &Path,
    relative_path: &str,
    extension: &str,
    body: String,
) -> Result<SourceDocument> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let modified_secs = modified
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    Ok(SourceDocument {
        path: path.to_path_buf(),
        relative_path: relative_path.to_string(),
        extension: extension.to_string(),
        body,
        modified_at: Utc
            .timestamp_opt(modified_secs, 0)
            .single()
            .unwrap_or_else(Utc::now),
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
