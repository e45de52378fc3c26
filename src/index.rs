//! Persistent vector index over SQLite.
//!
//! Stores one row per chunk: identifier, source, category, text, and the
//! embedding as a little-endian f32 BLOB. `rebuild` replaces the whole
//! entry set inside a single transaction; WAL readers keep seeing the
//! previous build generation until the commit, so no query ever observes
//! a partially rebuilt index. `query` loads the rows and ranks them by
//! cosine similarity in Rust.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::categorize::Category;
use crate::config::Config;
use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::EngineError;
use crate::models::{IndexEntry, LocalResult};

pub struct VectorIndex {
    pool: SqlitePool,
}

impl VectorIndex {
    /// Open (or create) the index database and ensure its schema.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                category TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                embedding BLOB NOT NULL,
                position INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| EngineError::IndexUnavailable(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| EngineError::IndexUnavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Atomically replace the entire entry set.
    ///
    /// The delete and all inserts run in one transaction: a failure
    /// partway leaves the previous generation untouched, and concurrent
    /// readers never see a mix of old and new entries. Insertion order is
    /// recorded in `position` and later used as the stable tie-break.
    pub async fn rebuild(&self, entries: &[IndexEntry], model_name: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;

        for (position, entry) in entries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO entries (id, source, category, chunk_index, text, hash, embedding, position)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.chunk.id)
            .bind(&entry.chunk.source)
            .bind(entry.chunk.category.as_str())
            .bind(entry.chunk.chunk_index)
            .bind(&entry.chunk.text)
            .bind(&entry.chunk.hash)
            .bind(vec_to_blob(&entry.embedding))
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        let generation = current_generation(&mut tx).await? + 1;
        let built_at = chrono::Utc::now().timestamp();

        for (key, value) in [
            ("generation", generation.to_string()),
            ("embedding_model", model_name.to_string()),
            ("built_at", built_at.to_string()),
        ] {
            sqlx::query(
                r#"
                INSERT INTO index_meta (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(generation)
    }

    /// Return the `k` nearest entries to `vector`, scored in `[0, 1]`
    /// (higher is better), sorted by descending score. Ties keep
    /// insertion order — the sort is stable over rows fetched in
    /// `position` order. An empty index yields an empty vector.
    pub async fn query(&self, vector: &[f32], k: usize, min_score: f64) -> Result<Vec<LocalResult>> {
        let rows = sqlx::query(
            "SELECT source, category, text, embedding FROM entries ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut results: Vec<LocalResult> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let embedding = blob_to_vec(&blob);
                let category: String = row.get("category");
                LocalResult {
                    content: row.get("text"),
                    source: row.get("source"),
                    category: Category::from_str(&category),
                    relevance_score: similarity_to_score(cosine_similarity(vector, &embedding)),
                }
            })
            .filter(|r| r.relevance_score >= min_score)
            .collect();

        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Number of entries in the current generation.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Current build generation (0 if never built).
    pub async fn generation(&self) -> Result<i64> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'generation'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// Chunk identifiers in insertion order, for inspection and tests.
    pub async fn entry_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM entries ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }
}

async fn current_generation(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
) -> Result<i64> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'generation'")
            .fetch_optional(&mut **tx)
            .await?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Map cosine similarity from `[-1, 1]` onto the bounded, higher-is-better
/// `[0, 1]` scale used in responses.
pub fn similarity_to_score(similarity: f32) -> f64 {
    (f64::from(similarity) + 1.0) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!((similarity_to_score(1.0) - 1.0).abs() < 1e-9);
        assert!((similarity_to_score(-1.0)).abs() < 1e-9);
        assert!((similarity_to_score(0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_monotonic() {
        assert!(similarity_to_score(0.9) > similarity_to_score(0.1));
        assert!(similarity_to_score(0.1) > similarity_to_score(-0.5));
    }
}
