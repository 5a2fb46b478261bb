//! Reddit JSON payloads and their conversion into domain types.

use chrono::{DateTime, Utc};
use helperbot_core::error::PlatformError;
use helperbot_core::platform::{Comment, SUBMISSION_PREFIX, Submission};
use regex_lite::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: serde_json::Value,
}

impl Thing {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, PlatformError> {
        serde_json::from_value(self.data)
            .map_err(|e| PlatformError::Malformed(format!("{} payload: {e}", self.kind)))
    }
}

#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    pub parent_id: String,
    /// Fullname of the submission (`t3_…`)
    pub link_id: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub created_utc: f64,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Comment {
            submission_id: raw
                .link_id
                .strip_prefix(SUBMISSION_PREFIX)
                .unwrap_or(&raw.link_id)
                .to_string(),
            id: raw.id,
            author: live_author(raw.author),
            body: raw.body,
            parent_id: raw.parent_id,
            subreddit: raw.subreddit,
            created_utc: timestamp(raw.created_utc),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSubmission {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub post_hint: Option<String>,
    #[serde(default)]
    pub is_gallery: Option<bool>,
    #[serde(default)]
    pub gallery_data: Option<GalleryData>,
    #[serde(default)]
    pub media_metadata: Option<HashMap<String, MediaItem>>,
    #[serde(default)]
    pub created_utc: f64,
}

#[derive(Debug, Deserialize)]
pub struct GalleryData {
    #[serde(default)]
    pub items: Vec<GalleryItem>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryItem {
    pub media_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaItem {
    /// Element kind, e.g. `Image` or `AnimatedImage`
    #[serde(default)]
    pub e: Option<String>,
    /// MIME type
    #[serde(default)]
    pub m: Option<String>,
    #[serde(default)]
    pub s: Option<MediaSource>,
}

#[derive(Debug, Deserialize)]
pub struct MediaSource {
    #[serde(default)]
    pub u: Option<String>,
}

impl MediaItem {
    fn image_url(&self) -> Option<String> {
        let is_image = self.m.as_deref().is_some_and(|m| m.contains("image"))
            || self.e.as_deref() == Some("Image");
        let url = self.s.as_ref()?.u.as_deref()?;
        is_image.then(|| url.replace("&amp;", "&"))
    }
}

impl RawSubmission {
    /// Gallery image URLs in gallery order; media missing from
    /// `gallery_data` follow in id order.
    fn gallery_images(&self) -> Vec<String> {
        let Some(media) = self.media_metadata.as_ref().filter(|_| self.is_gallery.unwrap_or(false)) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .gallery_data
            .as_ref()
            .map(|g| g.items.iter().map(|i| i.media_id.as_str()).collect())
            .unwrap_or_default();
        let mut rest: Vec<&str> = media.keys().map(String::as_str).filter(|k| !ids.contains(k)).collect();
        rest.sort_unstable();
        ids.extend(rest);

        ids.into_iter()
            .filter_map(|id| media.get(id))
            .filter_map(MediaItem::image_url)
            .collect()
    }
}

impl From<RawSubmission> for Submission {
    fn from(raw: RawSubmission) -> Self {
        let gallery_images = raw.gallery_images();
        Submission {
            id: raw.id,
            author: live_author(raw.author),
            subreddit: raw.subreddit,
            title: raw.title,
            selftext: raw.selftext,
            is_self: raw.is_self,
            url: raw.url.filter(|u| !u.is_empty()),
            permalink: raw.permalink,
            post_hint: raw.post_hint,
            gallery_images,
            created_utc: timestamp(raw.created_utc),
        }
    }
}

/// `/api/comment` response body.
#[derive(Debug, Deserialize)]
pub struct CommentResponse {
    pub json: CommentJson,
}

#[derive(Debug, Deserialize)]
pub struct CommentJson {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub data: Option<CommentData>,
}

#[derive(Debug, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub things: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub struct PostedThing {
    pub id: String,
}

impl CommentResponse {
    /// The new comment's id, or the API's complaint.
    pub fn into_result(self) -> Result<String, PlatformError> {
        if let Some(first) = self.json.errors.first() {
            let code = first.first().and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
            let message = first.get(1).and_then(|v| v.as_str()).unwrap_or_default();
            if code == "RATELIMIT" {
                return Err(PlatformError::RateLimited {
                    retry_after_secs: parse_retry_after(message).unwrap_or(60),
                });
            }
            return Err(PlatformError::Rejected(format!("{code}: {message}")));
        }
        let thing = self
            .json
            .data
            .and_then(|d| d.things.into_iter().next())
            .ok_or_else(|| PlatformError::Malformed("comment response without a thing".into()))?;
        Ok(thing.decode::<PostedThing>()?.id)
    }
}

/// `/api/v1/access_token` response body. Reddit reports bad credentials
/// with a 200 and an `error` field.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Me {
    pub name: String,
}

fn live_author(author: Option<String>) -> Option<String> {
    author.filter(|a| !a.is_empty() && a != "[deleted]")
}

fn timestamp(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}

fn retry_after_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*(second|minute|hour)").expect("static regex"))
}

/// Seconds from messages like "try again in 7 minutes."
pub fn parse_retry_after(message: &str) -> Option<u64> {
    let caps = retry_after_re().captures(message)?;
    let n: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    Some(match unit.as_str() {
        "hour" => n * 3_600,
        "minute" => n * 60,
        _ => n,
    })
}
