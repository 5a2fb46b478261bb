//! Model provider implementations for helperbot.
//!
//! All providers implement the `helperbot_core::Provider` trait. The bot
//! talks to OpenRouter, which exposes an OpenAI-compatible endpoint, so a
//! single implementation covers it and any other compatible backend.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
