//! `web_fetch`: lightweight HTTP GET with readable-text extraction.
//!
//! Pages that look script-gated are re-fetched through the renderer when
//! one is provisioned; otherwise the payload carries a hint so the model
//! can decide for itself.

use crate::backend::{PageFetcher, PageRenderer};
use crate::cache::{CacheMode, PageCache};
use crate::page::{PageArgs, PageDocument};
use async_trait::async_trait;
use helperbot_core::error::ToolError;
use helperbot_core::tool::{Tool, ToolKind};
use std::sync::Arc;
use tracing::{info, warn};

pub struct WebFetchTool {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Arc<dyn PageRenderer>,
    cache: Arc<PageCache>,
    output_cap: usize,
}

impl WebFetchTool {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        renderer: Arc<dyn PageRenderer>,
        cache: Arc<PageCache>,
        output_cap: usize,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            cache,
            output_cap,
        }
    }

    async fn retrieve(&self, args: &PageArgs) -> Result<PageDocument, ToolError> {
        let key = args.url.as_str();
        if let Some(doc) = self.cache.get(CacheMode::Fetch, key) {
            return Ok(doc);
        }
        let page = self.fetcher.fetch(&args.url).await?;
        let doc = PageDocument::build(&args.url, page, false)?;
        self.cache.insert(CacheMode::Fetch, key, doc.clone());
        Ok(doc)
    }

    /// Render fallback for script-gated pages; `None` when it is not
    /// possible or did not help.
    async fn render_fallback(&self, args: &PageArgs) -> Option<PageDocument> {
        let key = args.url.as_str();
        if let Some(doc) = self.cache.get(CacheMode::Render, key) {
            return Some(doc);
        }
        info!(url = %args.url, "Page looks script-gated, rendering");
        let rendered = self
            .renderer
            .render(&args.url, args.wait)
            .await
            .and_then(|page| PageDocument::build(&args.url, page, true));
        match rendered {
            Ok(doc) => {
                self.cache.insert(CacheMode::Render, key, doc.clone());
                Some(doc)
            }
            Err(e) => {
                warn!(url = %args.url, error = %e, "Render fallback failed");
                None
            }
        }
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebFetch
    }

    fn description(&self) -> &str {
        "Fetch a URL over plain HTTP and return its readable text, title and links. Fast; no JavaScript. \
         Good for articles, docs and APIs. Use web_render for pages that need a browser."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL to fetch."
                },
                "include_links": {
                    "type": "boolean",
                    "description": "Include up to 25 links found on the page (default true)."
                },
                "max_chars": {
                    "type": "integer",
                    "minimum": crate::page::MIN_TEXT_CHARS,
                    "maximum": crate::page::MAX_TEXT_CHARS,
                    "description": "Maximum characters of page text to return (default 20000)."
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args = PageArgs::parse(&arguments)?;
        let doc = self.retrieve(&args).await?;

        if doc.script_gated {
            if self.renderer.is_provisioned() {
                if let Some(rendered) = self.render_fallback(&args).await {
                    let mut payload = rendered.to_payload(args.max_chars, args.include_links, self.output_cap);
                    payload["fallback_from"] = serde_json::json!("web_fetch");
                    return Ok(payload);
                }
            }
            let mut payload = doc.to_payload(args.max_chars, args.include_links, self.output_cap);
            payload["hint"] = serde_json::json!(if self.renderer.is_provisioned() {
                "Little readable text; the page may need JavaScript. A browser render was attempted and failed."
            } else {
                "Little readable text; the page may need JavaScript. No browser renderer is available here."
            });
            return Ok(payload);
        }

        Ok(doc.to_payload(args.max_chars, args.include_links, self.output_cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FetchedPage, UnprovisionedRenderer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    struct StaticFetcher {
        content_type: &'static str,
        body: String,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(content_type: &'static str, body: impl Into<String>) -> Self {
            Self { content_type, body: body.into(), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage {
                final_url: url.to_string(),
                status_code: 200,
                content_type: self.content_type.into(),
                body: self.body.clone(),
                bytes_truncated: false,
            })
        }
    }

    struct DownFetcher;

    #[async_trait]
    impl PageFetcher for DownFetcher {
        async fn fetch(&self, _url: &Url) -> Result<FetchedPage, ToolError> {
            Err(ToolError::FetchUnavailable("timed out".into()))
        }
    }

    struct StaticRenderer {
        html: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageRenderer for StaticRenderer {
        fn is_provisioned(&self) -> bool {
            true
        }
        async fn render(&self, url: &Url, _wait: Duration) -> Result<FetchedPage, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage {
                final_url: url.to_string(),
                status_code: 200,
                content_type: "text/html".into(),
                body: self.html.clone(),
                bytes_truncated: false,
            })
        }
    }

    fn article() -> String {
        format!(
            "<html><head><title>Article</title></head><body><p>{}</p></body></html>",
            "Plenty of readable prose here. ".repeat(20)
        )
    }

    fn tool(fetcher: Arc<dyn PageFetcher>, renderer: Arc<dyn PageRenderer>) -> WebFetchTool {
        WebFetchTool::new(fetcher, renderer, Arc::new(PageCache::new(Duration::from_secs(300))), 20_000)
    }

    #[tokio::test]
    async fn fetch_extracts_article() {
        let t = tool(Arc::new(StaticFetcher::new("text/html", article())), Arc::new(UnprovisionedRenderer));
        let out = t.execute(serde_json::json!({"url": "https://example.com/a"})).await.unwrap();
        assert_eq!(out["title"], "Article");
        assert_eq!(out["status_code"], 200);
        assert!(out["text"].as_str().unwrap().contains("readable"));
        assert!(out.get("script_gated").is_none());
    }

    #[tokio::test]
    async fn second_fetch_hits_cache_with_new_max_chars() {
        let fetcher = Arc::new(StaticFetcher::new("text/plain", "z".repeat(3_000)));
        let t = tool(fetcher.clone(), Arc::new(UnprovisionedRenderer));
        let first = t.execute(serde_json::json!({"url": "https://example.com/t"})).await.unwrap();
        assert_eq!(first["text_truncated"], false);

        let second = t
            .execute(serde_json::json!({"url": "https://example.com/t", "max_chars": 500}))
            .await
            .unwrap();
        assert_eq!(second["text_truncated"], true);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn script_gated_page_falls_back_to_renderer() {
        let shell = "<html><body><div id=\"app\"></div><noscript>Please enable JavaScript</noscript></body></html>";
        let renderer = Arc::new(StaticRenderer { html: article(), calls: AtomicUsize::new(0) });
        let t = tool(Arc::new(StaticFetcher::new("text/html", shell)), renderer.clone());
        let out = t.execute(serde_json::json!({"url": "https://spa.example.com"})).await.unwrap();
        assert_eq!(out["rendered"], true);
        assert_eq!(out["fallback_from"], "web_fetch");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn script_gated_without_renderer_returns_hint() {
        let shell = "<html><body><div id=\"app\"></div></body></html>";
        let t = tool(Arc::new(StaticFetcher::new("text/html", shell)), Arc::new(UnprovisionedRenderer));
        let out = t.execute(serde_json::json!({"url": "https://spa.example.com"})).await.unwrap();
        assert_eq!(out["script_gated"], true);
        assert!(out["hint"].as_str().unwrap().contains("No browser renderer"));
    }

    #[tokio::test]
    async fn network_failure_is_fetch_unavailable() {
        let t = tool(Arc::new(DownFetcher), Arc::new(UnprovisionedRenderer));
        let err = t.execute(serde_json::json!({"url": "https://example.com"})).await.unwrap_err();
        assert_eq!(err.kind(), "fetch_unavailable");
    }

    #[tokio::test]
    async fn bad_url_is_invalid_arguments() {
        let t = tool(Arc::new(DownFetcher), Arc::new(UnprovisionedRenderer));
        let err = t.execute(serde_json::json!({"url": "javascript:alert(1)"})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }
}
