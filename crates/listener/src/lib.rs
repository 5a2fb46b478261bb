//! The helperbot listener.
//!
//! A single consumption loop reads the platform's comment stream, keeps
//! the comments that carry a trigger, and for each one builds a
//! transcript, asks the responder for a reply and posts it. Stream
//! failures back off and retry; only authorization failures stop the loop.

pub mod filter;
pub mod listener;
pub mod stats;

pub use filter::{TriggerFilter, Verdict};
pub use listener::{Listener, ListenerError};
pub use stats::{ErrorCategory, RunStats, spawn_status_reporter};
