//! Page documents: the extracted form of a fetched or rendered page, and
//! the payload shape returned to the model.

use crate::backend::FetchedPage;
use crate::extract;
use helperbot_core::error::ToolError;
use helperbot_core::text::{TRUNCATION_MARKER, char_len, truncate_chars};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Bounds on the `max_chars` argument.
pub const MIN_TEXT_CHARS: usize = 500;
pub const MAX_TEXT_CHARS: usize = 20_000;

/// Upper bound on the `wait_seconds` render argument.
pub const MAX_WAIT_SECS: f64 = 10.0;

/// Arguments shared by `web_fetch` and `web_render`.
#[derive(Debug, Clone)]
pub struct PageArgs {
    pub url: Url,
    pub include_links: bool,
    pub max_chars: usize,
    pub wait: Duration,
}

impl PageArgs {
    /// Parse model-supplied arguments. Out-of-range numbers are clamped,
    /// wrong types fall back to defaults; only a bad `url` is an error.
    pub fn parse(arguments: &Value) -> Result<Self, ToolError> {
        let url = extract::validate_url(arguments["url"].as_str().unwrap_or_default())?;
        let include_links = arguments["include_links"].as_bool().unwrap_or(true);
        let max_chars = arguments["max_chars"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(MAX_TEXT_CHARS)
            .clamp(MIN_TEXT_CHARS, MAX_TEXT_CHARS);
        let wait_secs = arguments["wait_seconds"]
            .as_f64()
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0)
            .min(MAX_WAIT_SECS);
        Ok(Self {
            url,
            include_links,
            max_chars,
            wait: Duration::from_secs_f64(wait_secs),
        })
    }
}

/// A fully extracted page. `text` is never truncated here; each caller's
/// `max_chars` is applied when building the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub content_type: String,
    pub title: String,
    pub text: String,
    pub links: Vec<String>,
    pub bytes_truncated: bool,
    pub script_gated: bool,
    pub rendered: bool,
}

impl PageDocument {
    /// Extract a document from a retrieved page.
    pub fn build(requested: &Url, page: FetchedPage, rendered: bool) -> Result<Self, ToolError> {
        let (is_html, is_textual) = extract::detect_content(&page.content_type, &page.body);
        if !is_textual && !rendered {
            return Err(ToolError::ExtractionFailed(format!(
                "unsupported content type '{}'",
                if page.content_type.is_empty() { "unknown" } else { &page.content_type }
            )));
        }

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| requested.clone());
        let (title, text, links, script_gated) =
            if let Some(pretty) = extract::pretty_json(&page.content_type, &page.body) {
                (String::new(), pretty, Vec::new(), false)
            } else if is_html || rendered {
                let text = extract::readable_text(&page.body)?;
                let gated = !rendered && extract::looks_script_gated(&page.body, &text);
                (
                    extract::extract_title(&page.body),
                    text,
                    extract::extract_links(&page.body, &base),
                    gated,
                )
            } else {
                (String::new(), page.body.trim().to_string(), Vec::new(), false)
            };

        Ok(Self {
            url: requested.to_string(),
            final_url: page.final_url,
            status_code: page.status_code,
            content_type: page.content_type,
            title,
            text,
            links,
            bytes_truncated: page.bytes_truncated,
            script_gated,
            rendered,
        })
    }

    /// The JSON payload for the model, fitted to `output_cap` characters
    /// when serialized: links go first, then the text is shortened.
    pub fn to_payload(&self, max_chars: usize, include_links: bool, output_cap: usize) -> Value {
        let mut include_links = include_links && !self.links.is_empty();
        let mut budget = max_chars;
        loop {
            let payload = self.payload_with(budget, include_links);
            let size = char_len(&payload.to_string());
            if size <= output_cap || budget == 0 {
                return payload;
            }
            if include_links {
                include_links = false;
                continue;
            }
            let overflow = size - output_cap + char_len(TRUNCATION_MARKER);
            budget = budget.min(char_len(&self.text)).saturating_sub(overflow);
        }
    }

    fn payload_with(&self, max_chars: usize, include_links: bool) -> Value {
        let (excerpt, truncated) = truncate_chars(&self.text, max_chars);
        let mut payload = json!({
            "url": self.url,
            "final_url": self.final_url,
            "status_code": self.status_code,
            "content_type": self.content_type,
            "title": self.title,
            "text": if truncated { format!("{excerpt}{TRUNCATION_MARKER}") } else { excerpt },
            "text_length": char_len(&self.text),
            "text_truncated": truncated,
            "bytes_truncated": self.bytes_truncated,
        });
        if include_links {
            payload["links"] = json!(self.links);
        }
        if self.script_gated {
            payload["script_gated"] = json!(true);
        }
        if self.rendered {
            payload["rendered"] = json!(true);
        }
        payload
    }
}
