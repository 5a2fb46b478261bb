//! Reddit adapter: OAuth script-app access to the comment stream, thing
//! lookups and replies.

use crate::auth::TokenSource;
use crate::stream::CommentStream;
use crate::wire::{CommentResponse, Listing, Me, RawComment, RawSubmission};
use async_trait::async_trait;
use helperbot_config::RedditConfig;
use helperbot_core::error::PlatformError;
use helperbot_core::platform::{COMMENT_PREFIX, Comment, Platform, SUBMISSION_PREFIX, StreamItem, Submission};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Comments requested per listing poll.
const LISTING_LIMIT: &str = "100";

/// Comment ids remembered by the stream.
const SEEN_WINDOW: usize = 2_000;

/// Where requests go. Overridable for tests.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://www.reddit.com/api/v1/access_token".into(),
            api_base: "https://oauth.reddit.com".into(),
        }
    }
}

pub struct RedditPlatform {
    client: reqwest::Client,
    auth: TokenSource,
    api_base: String,
    username: String,
    /// `a+b+c` multireddit path segment
    subreddits: String,
    poll_interval: Duration,
    stream: Mutex<CommentStream>,
}

impl RedditPlatform {
    /// Build from the `[reddit]` section. Every credential must be present.
    pub fn new(
        config: &RedditConfig,
        subreddits: &[String],
        endpoints: RedditEndpoints,
    ) -> Result<Self, PlatformError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| PlatformError::Unauthorized(format!("{name} is not set")))
        };
        let client_id = required(&config.client_id, "REDDIT_CLIENT_ID")?;
        let client_secret = required(&config.client_secret, "REDDIT_CLIENT_SECRET")?;
        let username = required(&config.username, "REDDIT_USERNAME")?;
        let password = required(&config.password, "REDDIT_PASSWORD")?;
        let user_agent = required(&config.user_agent, "USER_AGENT")?;

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlatformError::ConnectionLost(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            auth: TokenSource::new(endpoints.token_url, client_id, client_secret, username.clone(), password),
            api_base: endpoints.api_base.trim_end_matches('/').to_string(),
            username,
            subreddits: multireddit(subreddits),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            stream: Mutex::new(CommentStream::new(SEEN_WINDOW)),
        })
    }

    /// Send an authorized request, refreshing the token once if Reddit
    /// rejects it.
    async fn send<F>(&self, build: F, forbidden_is_fatal: bool) -> Result<reqwest::Response, PlatformError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.auth.token(&self.client).await?;
        let mut response = build(&self.client, &token).send().await.map_err(transport_error)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Access token rejected, refreshing");
            self.auth.invalidate().await;
            let token = self.auth.token(&self.client).await?;
            response = build(&self.client, &token).send().await.map_err(transport_error)?;
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::FORBIDDEN && !forbidden_is_fatal {
            return Err(PlatformError::Rejected(format!("forbidden ({status})")));
        }
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body, &headers))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        forbidden_is_fatal: bool,
    ) -> Result<T, PlatformError> {
        let url = format!("{}{path}", self.api_base);
        let response = self
            .send(|client, token| client.get(&url).query(query).bearer_auth(token), forbidden_is_fatal)
            .await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Malformed(format!("{path}: {e}")))
    }

    /// Resolve one thing by fullname via `/api/info`.
    async fn info<T: DeserializeOwned>(&self, fullname: &str) -> Result<T, PlatformError> {
        let listing: Listing = self
            .get_json("/api/info", &[("id", fullname), ("raw_json", "1")], false)
            .await?;
        listing
            .data
            .children
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(fullname.to_string()))?
            .decode()
    }

    /// The newest comments across the watched subreddits, newest first.
    async fn fetch_new_comments(&self) -> Result<Vec<Comment>, PlatformError> {
        let path = format!("/r/{}/comments", self.subreddits);
        let listing: Listing = self
            .get_json(&path, &[("limit", LISTING_LIMIT), ("raw_json", "1")], true)
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|t| t.kind == "t1")
            .filter_map(|t| match t.decode::<RawComment>() {
                Ok(raw) => Some(Comment::from(raw)),
                Err(e) => {
                    debug!(error = %e, "Skipping undecodable listing entry");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl Platform for RedditPlatform {
    fn name(&self) -> &str {
        "reddit"
    }

    fn bot_username(&self) -> &str {
        &self.username
    }

    async fn next_comment(&self) -> Result<StreamItem, PlatformError> {
        let mut stream = self.stream.lock().await;
        loop {
            if let Some(comment) = stream.pop() {
                return Ok(comment);
            }
            if stream.is_primed() {
                tokio::time::sleep(self.poll_interval).await;
            } else {
                info!(subreddits = %self.subreddits, "Priming comment stream");
            }
            let listing = self.fetch_new_comments().await?;
            let queued = stream.ingest(listing);
            if queued > 0 {
                debug!(queued, "New comments on stream");
            }
        }
    }

    async fn comment(&self, id: &str) -> Result<Comment, PlatformError> {
        let raw: RawComment = self.info(&format!("{COMMENT_PREFIX}{id}")).await?;
        Ok(raw.into())
    }

    async fn submission(&self, id: &str) -> Result<Submission, PlatformError> {
        let raw: RawSubmission = self.info(&format!("{SUBMISSION_PREFIX}{id}")).await?;
        Ok(raw.into())
    }

    async fn reply(&self, comment_id: &str, text: &str) -> Result<String, PlatformError> {
        let url = format!("{}/api/comment", self.api_base);
        let thing_id = format!("{COMMENT_PREFIX}{comment_id}");
        let response = self
            .send(
                |client, token| {
                    client.post(&url).bearer_auth(token).form(&[
                        ("api_type", "json"),
                        ("thing_id", thing_id.as_str()),
                        ("text", text),
                    ])
                },
                false,
            )
            .await?;
        let body: CommentResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Malformed(format!("/api/comment: {e}")))?;
        let id = body.into_result()?;
        debug!(comment_id, reply_id = %id, "Reply posted");
        Ok(id)
    }

    async fn health_check(&self) -> Result<bool, PlatformError> {
        let me: Me = self.get_json("/api/v1/me", &[], true).await?;
        let matches = me.name.eq_ignore_ascii_case(&self.username);
        if !matches {
            warn!(expected = %self.username, actual = %me.name, "Token belongs to a different account");
        }
        Ok(matches)
    }
}

fn multireddit(subreddits: &[String]) -> String {
    let names: Vec<&str> = subreddits
        .iter()
        .map(|s| s.trim().trim_start_matches("r/"))
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() || names.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        "all".into()
    } else {
        names.join("+")
    }
}

fn transport_error(e: reqwest::Error) -> PlatformError {
    if e.is_decode() {
        PlatformError::Malformed(e.to_string())
    } else {
        PlatformError::ConnectionLost(e.to_string())
    }
}

/// Map a non-success HTTP status onto the platform error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str, headers: &HeaderMap) -> PlatformError {
    let detail: String = body.chars().take(200).collect();
    match status.as_u16() {
        401 | 403 => PlatformError::Unauthorized(format!("{status}: {detail}")),
        404 => PlatformError::NotFound(detail),
        429 => PlatformError::RateLimited {
            retry_after_secs: headers
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| secs.ceil() as u64)
                .unwrap_or(60),
        },
        code if code >= 500 => PlatformError::Server {
            status_code: code,
            message: detail,
        },
        _ => PlatformError::Rejected(format!("{status}: {detail}")),
    }
}
