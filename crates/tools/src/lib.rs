//! Web tools for the responder.
//!
//! Three tools are exposed to the model: `web_search` (SearXNG),
//! `web_fetch` (plain HTTP with readable-text extraction) and
//! `web_render` (a remote headless browser). Fetch and render share a
//! short-lived page cache.

pub mod backend;
pub mod cache;
pub mod extract;
pub mod http;
pub mod page;
pub mod searxng;
pub mod web_fetch;
pub mod web_render;
pub mod web_search;

pub use backend::{
    FetchedPage, PageFetcher, PageRenderer, SearchBackend, SearchHit, SearchQuery, UnprovisionedRenderer,
};
pub use cache::{CacheMode, PageCache};
pub use http::{HttpFetcher, RemoteRenderer};
pub use page::{PageArgs, PageDocument};
pub use searxng::SearxngBackend;
pub use web_fetch::WebFetchTool;
pub use web_render::WebRenderTool;
pub use web_search::WebSearchTool;

use helperbot_config::ToolsConfig;
use helperbot_core::error::ToolError;
use helperbot_core::retry::RetryPolicy;
use helperbot_core::tool::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the registry with all three web tools wired to real backends.
///
/// A missing SearXNG URL is a configuration error; a missing render URL
/// only makes `web_render` report itself unavailable.
pub fn default_registry(config: &ToolsConfig, search_retry: &RetryPolicy) -> Result<ToolRegistry, ToolError> {
    let base = config
        .searxng_base_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ToolError::SearchUnavailable("SEARXNG_BASE_URL is not configured".into()))?;

    let search = SearxngBackend::new(
        base,
        Duration::from_secs(config.search_timeout_secs),
        config.searxng_accept_invalid_certs,
        search_retry.clone(),
    )?;
    let fetcher = HttpFetcher::new(
        &config.user_agent,
        Duration::from_secs(config.fetch_timeout_secs),
        config.max_fetch_bytes,
    )?;
    let renderer: Arc<dyn PageRenderer> = match config.render_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Arc::new(RemoteRenderer::new(
            url,
            &config.user_agent,
            Duration::from_secs(config.render_timeout_secs),
            config.max_fetch_bytes,
        )?),
        _ => Arc::new(UnprovisionedRenderer),
    };
    info!(
        searxng = base,
        renderer = renderer.is_provisioned(),
        "Web tools configured"
    );

    Ok(registry_with(
        Arc::new(search),
        Arc::new(fetcher),
        renderer,
        config,
    ))
}

/// Assemble the registry from explicit backends. Used by
/// [`default_registry`] and by tests that substitute fakes.
pub fn registry_with(
    search: Arc<dyn SearchBackend>,
    fetcher: Arc<dyn PageFetcher>,
    renderer: Arc<dyn PageRenderer>,
    config: &ToolsConfig,
) -> ToolRegistry {
    let cache = Arc::new(PageCache::new(Duration::from_secs(config.cache_ttl_secs)));
    let cap = config.max_output_chars;

    let mut registry = ToolRegistry::new()
        .with_call_timeout(Duration::from_secs(config.tool_timeout_secs))
        .with_max_output_chars(cap);
    registry.register(Box::new(WebSearchTool::new(search)));
    registry.register(Box::new(WebFetchTool::new(fetcher, renderer.clone(), cache.clone(), cap)));
    registry.register(Box::new(WebRenderTool::new(renderer, cache, cap)));
    registry
}
