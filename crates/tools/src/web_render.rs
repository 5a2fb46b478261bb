//! `web_render`: full headless-browser render for pages that need
//! JavaScript.

use crate::backend::PageRenderer;
use crate::cache::{CacheMode, PageCache};
use crate::page::{PageArgs, PageDocument};
use async_trait::async_trait;
use helperbot_core::error::ToolError;
use helperbot_core::tool::{Tool, ToolKind};
use std::sync::Arc;

pub struct WebRenderTool {
    renderer: Arc<dyn PageRenderer>,
    cache: Arc<PageCache>,
    output_cap: usize,
}

impl WebRenderTool {
    pub fn new(renderer: Arc<dyn PageRenderer>, cache: Arc<PageCache>, output_cap: usize) -> Self {
        Self {
            renderer,
            cache,
            output_cap,
        }
    }
}

#[async_trait]
impl Tool for WebRenderTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebRender
    }

    fn description(&self) -> &str {
        "Render a URL in a headless browser and return the rendered page text. Slower than web_fetch; \
         use it for JavaScript-heavy sites or when web_fetch returned little or no content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL to render."
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
                },
                "wait_seconds": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": crate::page::MAX_WAIT_SECS,
                    "description": "Extra seconds to wait after load for late content (default 0)."
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args = PageArgs::parse(&arguments)?;
        if !self.renderer.is_provisioned() {
            return Err(ToolError::RendererUnavailable(
                "no headless renderer is provisioned in this deployment; use web_fetch".into(),
            ));
        }

        let key = args.url.as_str();
        let doc = match self.cache.get(CacheMode::Render, key) {
            Some(doc) => doc,
            None => {
                let page = self.renderer.render(&args.url, args.wait).await?;
                let doc = PageDocument::build(&args.url, page, true)?;
                self.cache.insert(CacheMode::Render, key, doc.clone());
                doc
            }
        };

        Ok(doc.to_payload(args.max_chars, args.include_links, self.output_cap))
    }
}
