//! Prompt templates.

use chrono::{DateTime, Local, Utc};
use std::path::Path;

/// Built-in system prompt. `{local_time}` and `{utc_time}` are filled at
/// request time.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are HelperBot, a helpful assistant that answers questions in Reddit threads.

Current time: {local_time} (local), {utc_time}.

Guidelines:
- Answer the user's question directly. Be accurate, concise and friendly.
- Use the thread for context; quote it only when it helps.
- Use web_search for anything recent or that you are unsure about, then web_fetch to read the most relevant results.
- If web_fetch returns little text or flags the page as script_gated, try web_render.
- Cite sources as Markdown links when you used the web.
- Write Reddit-flavoured Markdown. No preamble, no sign-off.";

/// Wraps the serialized thread and the question into the user turn.
const PROMPT_HEADER: &str = "\
You are HelperBot, an AI assistant that helps Reddit users by replying to their comments.

Below is the full thread that led to the user's last comment. Use it to craft an accurate, concise reply. Write your final answer
as if you were replying directly to the user on Reddit. Do not include any preamble or explanation, just provide the answer.

--- BEGIN THREAD ---
{thread_text}
--- END OF THREAD ---

USER QUESTION (last comment): {user_question}";

/// Sent before the last permitted round-trip, which carries no tools.
pub const WRAP_UP_NUDGE: &str = "Tool attempts are complete. Provide a best-effort final answer now using available context \
and any successful tool outputs. If uncertainty remains, acknowledge it briefly.";

/// Returned when the model keeps asking for tools past the step budget and
/// never produced any text.
pub const STEP_BUDGET_MESSAGE: &str =
    "I wasn't able to finish researching this within my step budget, so I don't have a reliable answer yet.";

/// Read a system prompt override, or fall back to the built-in one.
pub fn load_system_template(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?.trim().to_string()),
        None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

/// Fill the timestamp placeholders of a system prompt template.
pub fn system_prompt(template: &str, now: DateTime<Utc>) -> String {
    let local = now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z").to_string();
    let utc = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    template.replace("{local_time}", &local).replace("{utc_time}", &utc)
}

pub fn user_prompt(thread_text: &str, user_question: &str) -> String {
    PROMPT_HEADER
        .replace("{thread_text}", thread_text)
        .replace("{user_question}", user_question)
}
