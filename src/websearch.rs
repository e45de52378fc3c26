//! Brave web search client.
//!
//! Thin wrapper around the Brave Search API returning compact
//! title/url/description tuples. The retriever treats every failure here
//! (missing credential, network error, quota, timeout) the same way:
//! log and degrade to zero web results. Nothing in this module is a hard
//! dependency of a query.

use anyhow::Result;
use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::error::EngineError;
use crate::models::WebResult;

/// Environment variable holding the Brave subscription token.
pub const API_KEY_ENV: &str = "BRAVE_API_KEY";

pub struct WebSearchClient {
    client: reqwest::Client,
    config: WebSearchConfig,
    api_key: Option<String>,
}

impl WebSearchClient {
    /// Build a client from configuration. A missing `BRAVE_API_KEY` is
    /// not a startup error — it becomes a per-query [`EngineError::WebSearchFailure`]
    /// that the retriever absorbs.
    pub fn from_config(config: &WebSearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        })
    }

    /// Override the API key (used by tests and by callers that supply
    /// the credential per request).
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Run a web search, returning at most `count` results.
    pub async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EngineError::WebSearchFailure(format!("{API_KEY_ENV} not set")))?;

        let mut request = self
            .client
            .get(&self.config.endpoint)
            .header("X-Subscription-Token", key)
            .header("Accept", "application/json")
            .query(&[
                ("q", query),
                ("count", &count.to_string()),
                ("country", &self.config.country),
                ("search_lang", &self.config.search_lang),
            ]);
        if let Some(ref safesearch) = self.config.safesearch {
            request = request.query(&[("safesearch", safesearch)]);
        }

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let request = request
                .try_clone()
                .ok_or_else(|| EngineError::WebSearchFailure("request not cloneable".into()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| EngineError::WebSearchFailure(e.to_string()))?;
                        return Ok(parse_results(&json, count));
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(EngineError::WebSearchFailure(format!(
                            "Brave API error {status}: {body_text}"
                        )));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    return Err(EngineError::WebSearchFailure(format!(
                        "Brave API error {status}: {body_text}"
                    ))
                    .into());
                }
                Err(e) => {
                    last_err = Some(EngineError::WebSearchFailure(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| EngineError::WebSearchFailure("failed after retries".into()))
            .into())
    }
}

/// Extract compact results from a Brave response body. Web results come
/// first; when the web block is empty the video block is used as a
/// fallback, matching Brave's layout for media-heavy queries.
pub(crate) fn parse_results(json: &serde_json::Value, count: usize) -> Vec<WebResult> {
    let mut results = collect_block(json, "web", count, |item| {
        item.get("profile")
            .and_then(|p| p.get("long_name").or_else(|| p.get("name")))
            .and_then(|v| v.as_str())
            .or_else(|| {
                item.get("meta_url")
                    .and_then(|m| m.get("hostname"))
                    .and_then(|v| v.as_str())
            })
            .map(|s| s.to_string())
    });

    if results.is_empty() {
        results = collect_block(json, "videos", count, |item| {
            item.get("meta_url")
                .and_then(|m| m.get("hostname"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        });
    }

    results
}

fn collect_block(
    json: &serde_json::Value,
    block: &str,
    count: usize,
    source_of: impl Fn(&serde_json::Value) -> Option<String>,
) -> Vec<WebResult> {
    let items = json
        .get(block)
        .and_then(|b| b.get("results"))
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(|v| v.as_str())?;
            let url = item.get("url").and_then(|v| v.as_str())?;
            let description = item
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Some(WebResult {
                title: title.to_string(),
                url: url.to_string(),
                description: strip_html(description),
                source: source_of(item),
            })
        })
        .take(count)
        .collect()
}

/// Remove HTML tags Brave embeds in descriptions (e.g. `<strong>`).
pub(crate) fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brave_fixture() -> serde_json::Value {
        serde_json::json!({
            "web": {
                "results": [
                    {
                        "title": "Trattoria da Mario",
                        "url": "https://example.com/mario",
                        "description": "Best <strong>pizza</strong> in town",
                        "profile": { "long_name": "example.com" }
                    },
                    {
                        "title": "Pizza guide",
                        "url": "https://example.org/guide",
                        "description": "A guide",
                        "meta_url": { "hostname": "example.org" }
                    },
                    {
                        "title": "Third",
                        "url": "https://example.net/3",
                        "description": ""
                    }
                ]
            }
        })
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("Best <strong>pizza</strong>!"), "Best pizza!");
        assert_eq!(strip_html("no tags"), "no tags");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_parse_web_results() {
        let results = parse_results(&brave_fixture(), 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Trattoria da Mario");
        assert_eq!(results[0].description, "Best pizza in town");
        assert_eq!(results[0].source.as_deref(), Some("example.com"));
        assert_eq!(results[1].source.as_deref(), Some("example.org"));
    }

    #[test]
    fn test_parse_respects_count() {
        let results = parse_results(&brave_fixture(), 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_video_fallback_when_no_web_results() {
        let json = serde_json::json!({
            "web": { "results": [] },
            "videos": {
                "results": [
                    {
                        "title": "Making pizza",
                        "url": "https://video.example/1",
                        "description": "watch <em>now</em>",
                        "meta_url": { "hostname": "video.example" }
                    }
                ]
            }
        });
        let results = parse_results(&json, 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Making pizza");
        assert_eq!(results[0].description, "watch now");
        assert_eq!(results[0].source.as_deref(), Some("video.example"));
    }

    #[test]
    fn test_items_without_title_or_url_are_dropped() {
        let json = serde_json::json!({
            "web": { "results": [ { "description": "no title or url" } ] }
        });
        assert!(parse_results(&json, 3).is_empty());
    }

    #[test]
    fn test_empty_body_yields_no_results() {
        assert!(parse_results(&serde_json::json!({}), 3).is_empty());
    }
}
