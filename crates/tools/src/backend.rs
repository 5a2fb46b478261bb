//! Backend seams for the web tools.
//!
//! Each tool is a thin adapter over one of these traits, so the tool logic
//! (argument handling, caching, truncation) is tested against in-memory
//! backends while production wires the HTTP implementations.

use async_trait::async_trait;
use helperbot_core::error::ToolError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A normalized search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub categories: Vec<String>,
    pub time_range: Option<String>,
    pub language: String,
    pub pageno: u32,
    pub max_results: usize,
}

/// One search hit, in backend rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    #[serde(default)]
    pub engines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// Search backend client.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Ranked results. Network, status and decoding failures surface as
    /// [`ToolError::SearchUnavailable`].
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ToolError>;
}

/// A retrieved page before extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    pub status_code: u16,
    /// Lowercased `Content-Type` header (may be empty)
    pub content_type: String,
    /// Body decoded as UTF-8 (lossy)
    pub body: String,
    /// Whether the body was cut at the byte cap
    pub bytes_truncated: bool,
}

/// Plain HTTP retrieval.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError>;
}

/// Headless-browser retrieval.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Whether a render service exists in this deployment.
    fn is_provisioned(&self) -> bool;

    /// Render `url`, waiting an extra `wait` after load. Returns the
    /// rendered DOM as HTML.
    async fn render(&self, url: &Url, wait: Duration) -> Result<FetchedPage, ToolError>;
}

/// Renderer used when no render service is configured.
pub struct UnprovisionedRenderer;

#[async_trait]
impl PageRenderer for UnprovisionedRenderer {
    fn is_provisioned(&self) -> bool {
        false
    }

    async fn render(&self, _url: &Url, _wait: Duration) -> Result<FetchedPage, ToolError> {
        Err(ToolError::RendererUnavailable(
            "no headless renderer is provisioned in this deployment".into(),
        ))
    }
}
