//! SearXNG search backend (JSON API).

use crate::backend::{SearchBackend, SearchHit, SearchQuery};
use async_trait::async_trait;
use helperbot_core::RetryPolicy;
use helperbot_core::error::ToolError;
use helperbot_core::text::truncate_with_marker;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct SearxngBackend {
    endpoint: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl SearxngBackend {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        accept_invalid_certs: bool,
        retry: RetryPolicy,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| ToolError::SearchUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            endpoint: search_endpoint(base_url),
            client,
            retry,
        })
    }

    async fn search_once(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ToolError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .query(&query_params(query))
            .send()
            .await
            .map_err(|e| ToolError::SearchUnavailable(format!("searxng request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::SearchUnavailable(format!("searxng read failed: {e}")))?;
        if !status.is_success() {
            return Err(ToolError::SearchUnavailable(format!(
                "searxng request failed ({status}): {}",
                truncate_with_marker(&body, 300)
            )));
        }

        let parsed: SearxngResponse = serde_json::from_str(&body)
            .map_err(|e| ToolError::SearchUnavailable(format!("searxng response parse failed: {e}")))?;
        let hits = parsed.results.into_iter().map(SearchHit::from).collect::<Vec<_>>();
        debug!(query = %query.query, hits = hits.len(), "SearXNG results");
        Ok(hits)
    }
}

#[async_trait]
impl SearchBackend for SearxngBackend {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ToolError> {
        self.retry
            .run("searxng", |_| self.search_once(query), |_| true)
            .await
    }
}

/// `{base}/search`, tolerating a base that already ends in `/search`.
fn search_endpoint(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/search") {
        base.to_string()
    } else {
        format!("{base}/search")
    }
}

fn query_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("format", "json".to_string()),
        ("language", query.language.clone()),
        ("pageno", query.pageno.max(1).to_string()),
    ];
    if !query.categories.is_empty() {
        params.push(("categories", query.categories.join(",")));
    }
    if let Some(range) = &query.time_range {
        params.push(("time_range", range.clone()));
    }
    params
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    engines: Vec<String>,
    #[serde(default, rename = "publishedDate", alias = "published_date")]
    published_date: Option<String>,
}

impl From<SearxngResult> for SearchHit {
    fn from(r: SearxngResult) -> Self {
        Self {
            title: r.title.unwrap_or_default().trim().to_string(),
            url: r.url.unwrap_or_default().trim().to_string(),
            snippet: r.content.unwrap_or_default().trim().to_string(),
            engines: r.engines,
            published_date: r
                .published_date
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolution() {
        assert_eq!(search_endpoint("https://s.local/searxng/"), "https://s.local/searxng/search");
        assert_eq!(search_endpoint("https://s.local/search"), "https://s.local/search");
    }

    #[test]
    fn params_include_optional_filters() {
        let q = SearchQuery {
            query: "rust async".into(),
            categories: vec!["news".into(), "it".into()],
            time_range: Some("month".into()),
            language: "en-US".into(),
            pageno: 0,
            max_results: 5,
        };
        let params = query_params(&q);
        assert!(params.contains(&("categories", "news,it".to_string())));
        assert!(params.contains(&("time_range", "month".to_string())));
        assert!(params.contains(&("pageno", "1".to_string())));
    }

    #[test]
    fn parse_results() {
        let body = r#"{"results": [
            {"title": " Tokio ", "url": "https://tokio.rs", "content": "async runtime", "engines": ["ddg"], "publishedDate": "2025-01-01"},
            {"title": null, "url": "https://x.test", "engines": []}
        ]}"#;
        let parsed: SearxngResponse = serde_json::from_str(body).unwrap();
        let hits: Vec<SearchHit> = parsed.results.into_iter().map(SearchHit::from).collect();
        assert_eq!(hits[0].title, "Tokio");
        assert_eq!(hits[0].published_date.as_deref(), Some("2025-01-01"));
        assert_eq!(hits[1].title, "");
        assert!(hits[1].published_date.is_none());
    }
}
