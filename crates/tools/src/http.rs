//! HTTP page fetcher and remote headless-render client.

use crate::backend::{FetchedPage, PageFetcher, PageRenderer};
use async_trait::async_trait;
use helperbot_core::error::ToolError;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Plain GET with a byte cap on the body.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, max_bytes: usize) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ToolError::FetchUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ToolError::FetchUnavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::FetchUnavailable(format!("HTTP request failed: status {status}")));
        }

        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);
        let (body, bytes_truncated) = read_capped(response, self.max_bytes)
            .await
            .map_err(|e| ToolError::FetchUnavailable(format!("reading body failed: {e}")))?;

        debug!(url = %url, final_url, status = status.as_u16(), bytes_truncated, "Fetched page");
        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            bytes_truncated,
        })
    }
}

/// Client for a browserless-style render service: `POST {base}/content`
/// with the target URL returns the rendered DOM.
pub struct RemoteRenderer {
    endpoint: String,
    client: reqwest::Client,
    max_bytes: usize,
}

impl RemoteRenderer {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration, max_bytes: usize) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::RendererUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            endpoint: format!("{}/content", base_url.trim().trim_end_matches('/')),
            client,
            max_bytes,
        })
    }
}

#[async_trait]
impl PageRenderer for RemoteRenderer {
    fn is_provisioned(&self) -> bool {
        true
    }

    async fn render(&self, url: &Url, wait: Duration) -> Result<FetchedPage, ToolError> {
        let mut body = serde_json::json!({
            "url": url.as_str(),
            "gotoOptions": { "waitUntil": "networkidle2", "timeout": 30_000 },
        });
        if !wait.is_zero() {
            body["waitForTimeout"] = serde_json::json!(wait.as_millis() as u64);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::RendererUnavailable(format!("render service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ToolError::FetchUnavailable(format!(
                "Browser render failed ({status}): {}",
                helperbot_core::text::truncate_with_marker(&detail, 300)
            )));
        }

        // The service reports the target's final URL and status in headers.
        let final_url = header_str(&response, "x-response-url").unwrap_or_else(|| url.to_string());
        let status_code = header_str(&response, "x-response-code")
            .and_then(|s| s.parse().ok())
            .unwrap_or(status.as_u16());
        let (html, bytes_truncated) = read_capped(response, self.max_bytes)
            .await
            .map_err(|e| ToolError::FetchUnavailable(format!("reading render output failed: {e}")))?;

        Ok(FetchedPage {
            final_url,
            status_code,
            content_type: "text/html".into(),
            body: html,
            bytes_truncated,
        })
    }
}

fn content_type_of(response: &reqwest::Response) -> String {
    header_str(response, "content-type")
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

fn header_str(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Read at most `max_bytes` of the body; the flag says whether more was left.
async fn read_capped(mut response: reqwest::Response, max_bytes: usize) -> Result<(String, bool), reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes.saturating_sub(buf.len());
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((String::from_utf8_lossy(&buf).into_owned(), truncated))
}
