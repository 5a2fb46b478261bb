//! HTML/text extraction helpers shared by `web_fetch` and `web_render`.

use helperbot_core::error::ToolError;
use regex_lite::Regex;
use std::sync::OnceLock;
use url::Url;

/// Links returned per page.
pub const MAX_LINKS: usize = 25;

/// Readable text shorter than this marks an HTML page as script-gated.
pub const SCRIPT_GATED_MIN_CHARS: usize = 200;

/// Wrap width handed to the HTML renderer.
const TEXT_WIDTH: usize = 100;

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex"))
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#).expect("static regex")
    })
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("static regex"))
}

/// Parse and check a model-supplied URL: http(s) only.
pub fn validate_url(raw: &str) -> Result<Url, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ToolError::InvalidArguments("url is required".into()));
    }
    let url = Url::parse(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("invalid url '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ToolError::InvalidArguments(
            "url must start with http:// or https://".into(),
        ));
    }
    Ok(url)
}

/// `(is_html, is_textual)` from the content type, sniffing the body when
/// the header is missing or generic.
pub fn detect_content(content_type: &str, body: &str) -> (bool, bool) {
    let ct = content_type.to_ascii_lowercase();
    let head: String = body.chars().take(2_000).collect::<String>().to_ascii_lowercase();
    let is_html = ct.contains("html") || head.contains("<html");
    let is_textual = is_html
        || ct.starts_with("text/")
        || ["json", "xml", "javascript"].iter().any(|m| ct.contains(m));
    (is_html, is_textual)
}

/// Pretty-print JSON bodies; `None` when the response is not JSON.
pub fn pretty_json(content_type: &str, body: &str) -> Option<String> {
    if !content_type.to_ascii_lowercase().contains("json") {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// The `<title>` text, entity-decoded with whitespace collapsed.
pub fn extract_title(html: &str) -> String {
    title_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(&decode_entities(m.as_str())))
        .unwrap_or_default()
}

/// Readable text of an HTML document.
pub fn readable_text(html: &str) -> Result<String, ToolError> {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map_err(|e| ToolError::ExtractionFailed(format!("HTML conversion failed: {e}")))?;
    let text = blank_lines_re().replace_all(&text, "\n\n");
    Ok(text.trim().to_string())
}

/// Up to [`MAX_LINKS`] unique absolute http(s) links, in document order.
pub fn extract_links(html: &str, base: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for cap in href_re().captures_iter(html) {
        let Some(raw) = cap.get(1) else { continue };
        let href = decode_entities(raw.as_str().trim());
        if href.is_empty()
            || ["#", "javascript:", "mailto:", "tel:"].iter().any(|p| href.starts_with(p))
        {
            continue;
        }
        let Ok(resolved) = base.join(&href) else { continue };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let resolved = resolved.to_string();
        if !links.contains(&resolved) {
            links.push(resolved);
            if links.len() >= MAX_LINKS {
                break;
            }
        }
    }
    links
}

/// Whether an HTML page probably needs script execution to show content.
pub fn looks_script_gated(html: &str, text: &str) -> bool {
    if text.chars().count() < SCRIPT_GATED_MIN_CHARS {
        return true;
    }
    let lower = text.to_lowercase();
    let html_lower = html.to_lowercase();
    ["enable javascript", "javascript is disabled", "requires javascript"]
        .iter()
        .any(|p| lower.contains(p) || html_lower.contains(p))
        && text.chars().count() < SCRIPT_GATED_MIN_CHARS * 10
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities that show up in titles and hrefs.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
