//! # HelperBot Core
//!
//! Domain types, traits, and error definitions for the helperbot reply bot.
//! This crate has **no I/O** of its own. It defines the domain model that
//! the platform adapter, the model provider and the web tools implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every external boundary is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod platform;
pub mod provider;
pub mod retry;
pub mod seen;
pub mod text;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ContextError, Error, PlatformError, ProviderError, Result, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use platform::{Comment, Platform, StreamItem, Submission};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use retry::RetryPolicy;
pub use seen::SeenWindow;
pub use tool::{Tool, ToolCall, ToolKind, ToolRegistry, ToolResult};
