//! Reddit access for helperbot.
//!
//! [`RedditPlatform`] implements [`helperbot_core::platform::Platform`]
//! over the OAuth API: a polled comment stream, thing lookups for
//! building transcripts, and replies.

mod auth;
pub mod reddit;
pub mod stream;
mod wire;

pub use reddit::{RedditEndpoints, RedditPlatform};
pub use stream::CommentStream;
pub use wire::parse_retry_after;
