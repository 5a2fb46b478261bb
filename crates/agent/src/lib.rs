//! Turning a trigger into a reply.
//!
//! 1. **Transcript**: resolve the thread around the triggering comment and
//!    bound it to the context budget ([`TranscriptBuilder`])
//! 2. **Prompt**: system prompt with timestamps, user turn with the thread,
//!    the question and any images ([`prompt`])
//! 3. **Respond**: call the model, run requested web tools, feed results
//!    back, repeat until text or the step budget runs out ([`Responder`])

pub mod prompt;
pub mod responder;
pub mod transcript;

pub use responder::{ConversationState, Reply, Responder, ResponderError, ResponderState};
pub use transcript::{ImageRef, ThreadHeader, Transcript, TranscriptBuilder, Turn, TurnRole};
