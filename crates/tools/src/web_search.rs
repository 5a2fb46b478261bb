//! `web_search`: query the search backend and return a compact,
//! deduplicated result list.

use crate::backend::{SearchBackend, SearchHit, SearchQuery};
use async_trait::async_trait;
use helperbot_core::error::ToolError;
use helperbot_core::tool::{Tool, ToolKind};
use std::sync::Arc;

/// SearXNG categories the model may ask for.
pub const CATEGORIES: &[&str] = &[
    "general", "images", "videos", "news", "map", "music", "it", "science", "files", "social media",
];

/// Accepted `time_range` values.
pub const TIME_RANGES: &[&str] = &["day", "month", "year"];

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_RESULTS: usize = 10;

pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns ranked results with titles, URLs and snippets. \
         Use web_fetch on a result URL to read the page itself."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string."
                },
                "categories": {
                    "type": "array",
                    "items": { "type": "string", "enum": CATEGORIES },
                    "description": "Optional search categories."
                },
                "time_range": {
                    "type": "string",
                    "enum": TIME_RANGES,
                    "description": "Optional recency filter."
                },
                "language": {
                    "type": "string",
                    "description": "Result language code (default en-US)."
                },
                "pageno": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Result page number (default 1)."
                },
                "max_results": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RESULTS,
                    "description": "Number of results to return (default 5)."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let query = parse_query(&arguments)?;
        let hits = self.backend.search(&query).await?;
        let results = dedup_by_url(hits)
            .into_iter()
            .take(query.max_results)
            .collect::<Vec<_>>();

        Ok(serde_json::json!({
            "query": query.query,
            "result_count": results.len(),
            "results": results,
        }))
    }
}

/// Normalize the model's arguments. Unknown categories and time ranges are
/// dropped rather than rejected.
fn parse_query(arguments: &serde_json::Value) -> Result<SearchQuery, ToolError> {
    let query = arguments["query"].as_str().unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(ToolError::InvalidArguments("query is required".into()));
    }

    let categories = arguments["categories"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c.as_str())
                .map(|c| c.trim().to_lowercase())
                .filter(|c| CATEGORIES.contains(&c.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let time_range = arguments["time_range"]
        .as_str()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| TIME_RANGES.contains(&t.as_str()));

    let language = arguments["language"]
        .as_str()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    let pageno = arguments["pageno"].as_u64().unwrap_or(1).clamp(1, 50) as u32;
    let max_results = arguments["max_results"]
        .as_u64()
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_RESULTS);

    Ok(SearchQuery {
        query,
        categories,
        time_range,
        language,
        pageno,
        max_results,
    })
}

/// Drop hits without a URL and merge duplicates into the first occurrence.
fn dedup_by_url(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut out: Vec<SearchHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        if hit.url.is_empty() {
            continue;
        }
        match out.iter_mut().find(|h| h.url == hit.url) {
            Some(existing) => {
                for engine in hit.engines {
                    if !existing.engines.contains(&engine) {
                        existing.engines.push(engine);
                    }
                }
            }
            None => out.push(hit),
        }
    }
    out
}
