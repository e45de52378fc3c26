//! End-to-end tests for the ingestion pipeline and hybrid retriever,
//! using a deterministic in-process embedding provider so no model
//! download or network access is needed.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use tavola::config::Config;
use tavola::embedding::EmbeddingProvider;
use tavola::index::VectorIndex;
use tavola::ingest::rebuild_index;
use tavola::models::RetrievalResponse;
use tavola::retrieve::{HybridRetriever, RagRequest};
use tavola::websearch::WebSearchClient;

const DIMS: usize = 32;

/// Deterministic bag-of-words hashing embedder. Texts sharing words get
/// similar vectors, which is enough signal for ranking assertions.
struct StubProvider;

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0f32; DIMS];
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in token.bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        v[(h % DIMS as u64) as usize] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    fn model_name(&self) -> &str {
        "stub-bow-32"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }
}

fn test_config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.data.dir = data_dir.to_path_buf();
    config.db.path = Some(data_dir.join("index").join("tavola.sqlite"));
    config
}

fn build_retriever(config: &Config, index: Arc<VectorIndex>) -> HybridRetriever {
    HybridRetriever::new(
        index,
        Arc::new(StubProvider),
        WebSearchClient::from_config(&config.web_search).unwrap(),
        config.retrieval.clone(),
    )
}

async fn ask(retriever: &HybridRetriever, config: &Config, params: serde_json::Value) -> RetrievalResponse {
    let request = RagRequest::from_params(&params, &config.retrieval, &config.web_search).unwrap();
    retriever.retrieve(&request).await.unwrap()
}

#[tokio::test]
async fn ingest_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("menu_today.txt"), "Pizza and pasta.").unwrap();
    fs::write(
        tmp.path().join("info.txt"),
        "Family restaurant since 1987.\n\nWe love our guests.",
    )
    .unwrap();

    let config = test_config(tmp.path());
    let index = VectorIndex::open(&config).await.unwrap();

    let first = rebuild_index(&config, &StubProvider, &index).await.unwrap();
    let ids_first = index.entry_ids().await.unwrap();

    let second = rebuild_index(&config, &StubProvider, &index).await.unwrap();
    let ids_second = index.entry_ids().await.unwrap();

    assert_eq!(first.chunks, second.chunks);
    assert_eq!(ids_first, ids_second);
    assert_eq!(second.generation, first.generation + 1);
    // The persisted generation counter matches the last rebuild.
    assert_eq!(index.generation().await.unwrap(), second.generation);

    // Identical index content gives identical query results and scores.
    let retriever = build_retriever(&config, Arc::new(index));
    let a = ask(&retriever, &config, serde_json::json!({ "query": "pizza" })).await;
    let b = ask(&retriever, &config, serde_json::json!({ "query": "pizza" })).await;
    assert_eq!(a.local_count, b.local_count);
    for (x, y) in a.local_results.iter().zip(b.local_results.iter()) {
        assert_eq!(x.source, y.source);
        assert_eq!(x.relevance_score, y.relevance_score);
    }
}

#[tokio::test]
async fn rebuild_drops_removed_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("menu_today.txt"), "Margherita pizza").unwrap();
    fs::write(tmp.path().join("hours.txt"), "Open 12:00 to 23:00").unwrap();

    let config = test_config(tmp.path());
    let index = Arc::new(VectorIndex::open(&config).await.unwrap());

    rebuild_index(&config, &StubProvider, &index).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 2);

    fs::remove_file(tmp.path().join("hours.txt")).unwrap();
    rebuild_index(&config, &StubProvider, &index).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 1);

    let retriever = build_retriever(&config, index);
    let response = ask(
        &retriever,
        &config,
        serde_json::json!({ "query": "open hours", "top_k": 10 }),
    )
    .await;
    assert!(
        response.local_results.iter().all(|r| r.source != "hours.txt"),
        "stale entries survived the rebuild"
    );
}

#[tokio::test]
async fn empty_directory_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let index = Arc::new(VectorIndex::open(&config).await.unwrap());

    let report = rebuild_index(&config, &StubProvider, &index).await.unwrap();
    assert_eq!(report.documents, 0);
    assert_eq!(report.chunks, 0);

    let retriever = build_retriever(&config, index);
    let response = ask(&retriever, &config, serde_json::json!({ "query": "anything" })).await;
    assert_eq!(response.local_count, 0);
    assert!(response.local_results.is_empty());
}

#[tokio::test]
async fn results_respect_top_k_and_are_sorted() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("menu_today.txt"), "pizza pasta tiramisu").unwrap();
    fs::write(tmp.path().join("location.txt"), "Via Roma 1, Bologna").unwrap();
    fs::write(tmp.path().join("contact.txt"), "phone 051 123456").unwrap();
    fs::write(tmp.path().join("policy.txt"), "no dogs allowed inside").unwrap();

    let config = test_config(tmp.path());
    let index = Arc::new(VectorIndex::open(&config).await.unwrap());
    rebuild_index(&config, &StubProvider, &index).await.unwrap();

    let retriever = build_retriever(&config, index);
    let response = ask(
        &retriever,
        &config,
        serde_json::json!({ "query": "pizza in Bologna", "top_k": 2 }),
    )
    .await;

    assert!(response.local_results.len() <= 2);
    assert_eq!(response.local_count, response.local_results.len());
    for pair in response.local_results.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
    // Web search was not requested.
    assert_eq!(response.web_count, 0);
    assert!(response.web_results.is_empty());
}

#[tokio::test]
async fn menu_scenario() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("menu_today.txt"),
        "Today's special: Margherita pizza, €8",
    )
    .unwrap();

    let config = test_config(tmp.path());
    let index = Arc::new(VectorIndex::open(&config).await.unwrap());
    rebuild_index(&config, &StubProvider, &index).await.unwrap();

    let retriever = build_retriever(&config, index);
    let response = ask(
        &retriever,
        &config,
        serde_json::json!({
            "query": "What's on the menu today?",
            "top_k": 1,
            "include_web_search": false
        }),
    )
    .await;

    assert_eq!(response.local_count, 1);
    let result = &response.local_results[0];
    assert_eq!(result.source, "menu_today.txt");
    assert!(result.content.contains("Margherita pizza"));
    assert!(result.relevance_score >= 0.0 && result.relevance_score <= 1.0);

    // The JSON shape seen by the calling agent.
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["local_results"][0]["type"], "menu");
    assert_eq!(json["local_count"], 1);
    assert_eq!(json["web_count"], 0);
}

#[tokio::test]
async fn web_search_failure_degrades_to_local_only() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("menu_today.txt"), "Margherita pizza").unwrap();

    let mut config = test_config(tmp.path());
    // Unroutable endpoint and no retries: the search fails fast and the
    // retriever must absorb it.
    config.web_search.endpoint = "http://127.0.0.1:1/res/v1/web/search".to_string();
    config.web_search.timeout_secs = 1;
    config.web_search.max_retries = 0;

    let index = Arc::new(VectorIndex::open(&config).await.unwrap());
    rebuild_index(&config, &StubProvider, &index).await.unwrap();

    let retriever = HybridRetriever::new(
        index,
        Arc::new(StubProvider),
        WebSearchClient::from_config(&config.web_search)
            .unwrap()
            .with_api_key("test-key"),
        config.retrieval.clone(),
    );

    let response = ask(
        &retriever,
        &config,
        serde_json::json!({ "query": "pizza", "include_web_search": true }),
    )
    .await;

    assert_eq!(response.web_count, 0);
    assert!(response.web_results.is_empty());
    assert_eq!(response.local_count, 1);
    assert_eq!(response.local_results[0].source, "menu_today.txt");
}
