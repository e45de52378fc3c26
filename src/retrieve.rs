//! Hybrid local + web retrieval.
//!
//! One query flows Received → LocalLookup → (OptionalWebLookup) →
//! Merged → Returned. Local results come from the vector index; web
//! results are a best-effort augmentation that never fails the query.
//! The two lists stay separate in the response — vector similarity and
//! web engine ranking are incompatible scales and merging them would
//! invent a cross-scale ranking the caller never asked for.
//!
//! Parameter handling is deliberately forgiving: the tool is called by a
//! language model that may pass numbers as strings, out-of-range counts,
//! or any of the `query`/`question`/`q` aliases. Everything except a
//! missing query is clamped or coerced rather than rejected.

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::config::{RetrievalConfig, WebSearchConfig};
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::EngineError;
use crate::index::VectorIndex;
use crate::models::RetrievalResponse;
use crate::websearch::WebSearchClient;

/// A validated, normalized query.
#[derive(Debug, Clone, PartialEq)]
pub struct RagRequest {
    pub query: String,
    pub top_k: i64,
    pub include_web_search: bool,
    pub web_results_count: i64,
}

impl RagRequest {
    /// Resolve loose tool-call parameters into a request.
    ///
    /// `query`, `question`, and `q` are synonymous; the first one that
    /// carries non-blank text wins. Counts accept integers or numeric
    /// strings; zero, negative, or unparseable values fall back to the
    /// configured default, and everything is clamped to the configured
    /// maximum. Only a missing query is an error.
    pub fn from_params(
        params: &serde_json::Value,
        retrieval: &RetrievalConfig,
        web: &WebSearchConfig,
    ) -> Result<Self, EngineError> {
        let query = ["query", "question", "q"]
            .iter()
            .filter_map(|key| params.get(key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .ok_or(EngineError::MissingQuery)?
            .to_string();

        let top_k = lenient_count(
            params.get("top_k"),
            retrieval.default_top_k,
            retrieval.max_top_k,
        );
        let web_results_count = lenient_count(
            params.get("web_results_count"),
            web.default_count,
            web.max_count,
        );
        let include_web_search = lenient_bool(params.get("include_web_search"));

        Ok(Self {
            query,
            top_k,
            include_web_search,
            web_results_count,
        })
    }
}

/// Coerce a count parameter: integer or numeric string; non-positive or
/// malformed values become `default`; the result is clamped to `max`.
fn lenient_count(value: Option<&serde_json::Value>, default: i64, max: i64) -> i64 {
    let parsed = match value {
        Some(v) if v.is_i64() || v.is_u64() => v.as_i64(),
        Some(v) => v.as_str().and_then(|s| s.trim().parse::<i64>().ok()),
        None => None,
    };
    match parsed {
        Some(n) if n >= 1 => n.min(max),
        _ => default,
    }
}

/// Coerce a boolean parameter: accepts a real boolean or a
/// `"true"`/`"false"` string; anything else is `false`.
fn lenient_bool(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(v) if v.is_boolean() => v.as_bool().unwrap_or(false),
        Some(v) => v
            .as_str()
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        None => false,
    }
}

/// The query-time engine: one shared embedding provider, one index
/// handle, one web client, owned for the process lifetime.
pub struct HybridRetriever {
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    web: WebSearchClient,
    retrieval: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        index: Arc<VectorIndex>,
        provider: Arc<dyn EmbeddingProvider>,
        web: WebSearchClient,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            provider,
            web,
            retrieval,
        }
    }

    /// Execute one query end to end.
    ///
    /// Local lookup errors propagate (without embeddings or the index
    /// the engine is non-functional); web search errors are absorbed
    /// into an empty web list.
    pub async fn retrieve(&self, request: &RagRequest) -> Result<RetrievalResponse> {
        let vector = embed_query(self.provider.as_ref(), &request.query).await?;
        let local_results = self
            .index
            .query(&vector, request.top_k as usize, self.retrieval.min_score)
            .await?;

        let web_results = if request.include_web_search {
            match self
                .web
                .search(&request.query, request.web_results_count as usize)
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    warn!(error = %e, query = %request.query, "web search degraded to empty results");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(RetrievalResponse {
            query: request.query.clone(),
            local_count: local_results.len(),
            local_results,
            web_count: web_results.len(),
            web_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(params: serde_json::Value) -> Result<RagRequest, EngineError> {
        RagRequest::from_params(
            &params,
            &RetrievalConfig::default(),
            &WebSearchConfig::default(),
        )
    }

    #[test]
    fn test_query_aliases() {
        for key in ["query", "question", "q"] {
            let req = parse(serde_json::json!({ key: "menu?" })).unwrap();
            assert_eq!(req.query, "menu?");
        }
    }

    #[test]
    fn test_first_nonblank_alias_wins() {
        let req = parse(serde_json::json!({ "query": "  ", "question": "hours?" })).unwrap();
        assert_eq!(req.query, "hours?");
    }

    #[test]
    fn test_missing_query_is_error() {
        let err = parse(serde_json::json!({})).unwrap_err();
        assert!(matches!(err, EngineError::MissingQuery));

        let err = parse(serde_json::json!({ "query": "", "question": "", "q": "" })).unwrap_err();
        assert!(matches!(err, EngineError::MissingQuery));
    }

    #[test]
    fn test_defaults() {
        let req = parse(serde_json::json!({ "q": "hi" })).unwrap();
        assert_eq!(req.top_k, 3);
        assert_eq!(req.web_results_count, 2);
        assert!(!req.include_web_search);
    }

    #[test]
    fn test_top_k_clamped_to_max() {
        let req = parse(serde_json::json!({ "q": "hi", "top_k": 999 })).unwrap();
        assert_eq!(req.top_k, 10);
    }

    #[test]
    fn test_nonpositive_counts_fall_back_to_default() {
        let req = parse(serde_json::json!({ "q": "hi", "top_k": 0, "web_results_count": -4 }))
            .unwrap();
        assert_eq!(req.top_k, 3);
        assert_eq!(req.web_results_count, 2);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let req = parse(serde_json::json!({ "q": "hi", "top_k": "5" })).unwrap();
        assert_eq!(req.top_k, 5);

        let req = parse(serde_json::json!({ "q": "hi", "top_k": "lots" })).unwrap();
        assert_eq!(req.top_k, 3);
    }

    #[test]
    fn test_lenient_booleans() {
        let req = parse(serde_json::json!({ "q": "hi", "include_web_search": true })).unwrap();
        assert!(req.include_web_search);

        let req = parse(serde_json::json!({ "q": "hi", "include_web_search": "True" })).unwrap();
        assert!(req.include_web_search);

        let req = parse(serde_json::json!({ "q": "hi", "include_web_search": "nope" })).unwrap();
        assert!(!req.include_web_search);
    }
}
