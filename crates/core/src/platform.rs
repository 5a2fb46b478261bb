//! Platform trait: the abstraction over the discussion site.
//!
//! A Platform produces the live comment stream, resolves comments and
//! submissions by id, and posts replies. Errors carry an explicit
//! transient/fatal classification (see [`PlatformError::is_transient`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::PlatformError;

/// Fullname prefix of a comment.
pub const COMMENT_PREFIX: &str = "t1_";
/// Fullname prefix of a submission.
pub const SUBMISSION_PREFIX: &str = "t3_";

/// A comment, either read from the stream or resolved as an ancestor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Bare id (without the `t1_` prefix)
    pub id: String,

    /// Author name; `None` when the account was deleted
    #[serde(default)]
    pub author: Option<String>,

    /// Markdown body
    pub body: String,

    /// Fullname of the parent (`t1_…` for a comment, `t3_…` for the submission)
    pub parent_id: String,

    /// Bare id of the submission this comment belongs to
    pub submission_id: String,

    /// Subreddit display name
    pub subreddit: String,

    /// Creation time
    pub created_utc: DateTime<Utc>,
}

/// A raw incoming comment from the live stream.
pub type StreamItem = Comment;

impl Comment {
    /// Fullname (`t1_<id>`).
    pub fn fullname(&self) -> String {
        format!("{COMMENT_PREFIX}{}", self.id)
    }

    /// Top-level comments hang directly off the submission.
    pub fn is_root(&self) -> bool {
        self.parent_id.starts_with(SUBMISSION_PREFIX)
    }

    /// Bare id of the parent comment, if the parent is a comment.
    pub fn parent_comment_id(&self) -> Option<&str> {
        self.parent_id.strip_prefix(COMMENT_PREFIX)
    }
}

/// The post at the root of a comment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Submission {
    /// Bare id (without the `t3_` prefix)
    pub id: String,

    #[serde(default)]
    pub author: Option<String>,

    pub subreddit: String,

    pub title: String,

    /// Self-post body; empty for link posts
    #[serde(default)]
    pub selftext: String,

    pub is_self: bool,

    /// Linked URL (for self posts this is the permalink URL)
    #[serde(default)]
    pub url: Option<String>,

    /// Site-relative permalink (`/r/…/comments/…`)
    pub permalink: String,

    /// Post hint such as `image`, `link`, `hosted:video`
    #[serde(default)]
    pub post_hint: Option<String>,

    /// Source URLs of gallery images, in gallery order
    #[serde(default)]
    pub gallery_images: Vec<String>,

    pub created_utc: DateTime<Utc>,
}

/// The core Platform trait.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Human-readable platform name (e.g., "reddit").
    fn name(&self) -> &str;

    /// The account the bot posts as; its own comments never trigger.
    fn bot_username(&self) -> &str;

    /// Wait for the next comment on the live stream.
    async fn next_comment(&self) -> std::result::Result<StreamItem, PlatformError>;

    /// Resolve a comment by bare id.
    async fn comment(&self, id: &str) -> std::result::Result<Comment, PlatformError>;

    /// Resolve a submission by bare id.
    async fn submission(&self, id: &str) -> std::result::Result<Submission, PlatformError>;

    /// Post `text` as a reply to the comment with bare id `comment_id`.
    /// Returns the id of the new comment.
    async fn reply(&self, comment_id: &str, text: &str) -> std::result::Result<String, PlatformError>;

    /// Health check: are the credentials accepted?
    async fn health_check(&self) -> std::result::Result<bool, PlatformError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(parent: &str) -> Comment {
        Comment {
            id: "abc".into(),
            author: Some("alice".into()),
            body: "hello".into(),
            parent_id: parent.into(),
            submission_id: "xyz".into(),
            subreddit: "rust".into(),
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn root_detection() {
        assert!(comment("t3_xyz").is_root());
        assert!(!comment("t1_def").is_root());
    }

    #[test]
    fn parent_comment_id_strips_prefix() {
        assert_eq!(comment("t1_def").parent_comment_id(), Some("def"));
        assert_eq!(comment("t3_xyz").parent_comment_id(), None);
    }

    #[test]
    fn fullname_has_prefix() {
        assert_eq!(comment("t3_xyz").fullname(), "t1_abc");
    }
}
