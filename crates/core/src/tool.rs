//! Tool trait: the abstraction over capabilities the model may invoke.
//!
//! The set of tools is closed: [`ToolKind`] enumerates every name the model
//! is allowed to call, and the [`ToolRegistry`] is the dispatch table from
//! name to handler + argument schema. Dispatch never fails: unknown names,
//! bad arguments, backend errors and timeouts all come back as a failed
//! [`ToolResult`] so the model can decide what to do next.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;
use crate::text::{char_len, truncate_with_marker};

/// Every tool the model can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    WebFetch,
    WebRender,
}

impl ToolKind {
    /// All kinds, in the order their schemas are sent to the model.
    pub const ALL: [ToolKind; 3] = [ToolKind::WebSearch, ToolKind::WebFetch, ToolKind::WebRender];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::WebFetch => "web_fetch",
            Self::WebRender => "web_render",
        }
    }

    /// Resolve a model-supplied tool name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// The failure a call of this kind surfaces when it exceeds its timeout.
    pub fn timeout_error(&self, timeout: Duration) -> ToolError {
        let msg = format!("{} timed out after {}s", self.as_str(), timeout.as_secs());
        match self {
            Self::WebSearch => ToolError::SearchUnavailable(msg),
            Self::WebFetch => ToolError::FetchUnavailable(msg),
            Self::WebRender => ToolError::RendererUnavailable(msg),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute, as emitted by the model
    pub name: String,

    /// Arguments as a JSON value (`Null` when the model sent unparseable JSON)
    pub arguments: serde_json::Value,
}

impl From<&MessageToolCall> for ToolCall {
    fn from(tc: &MessageToolCall) -> Self {
        let raw = if tc.arguments.trim().is_empty() { "{}" } else { tc.arguments.as_str() };
        Self {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: serde_json::from_str(raw).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// The result of a tool execution, always fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The tool name from the originating call
    pub name: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// Serialized payload: the tool output, or `{"error": {kind, message}}`
    pub output: String,
}

impl ToolResult {
    pub fn success(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(call: &ToolCall, error: &ToolError) -> Self {
        let payload = serde_json::json!({
            "error": {
                "kind": error.kind(),
                "message": error.to_string(),
            }
        });
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: false,
            output: payload.to_string(),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which registered name this tool answers to.
    fn kind(&self) -> ToolKind;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool. The returned JSON is serialized as the tool result.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().as_str().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Dispatch table from [`ToolKind`] to handler.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Box<dyn Tool>>,
    call_timeout: Duration,
    max_output_chars: usize,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("call_timeout", &self.call_timeout)
            .field("max_output_chars", &self.max_output_chars)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            call_timeout: Duration::from_secs(60),
            max_output_chars: 20_000,
        }
    }

    /// Upper bound on a single tool call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Hard cap on a serialized tool result.
    pub fn with_max_output_chars(mut self, max: usize) -> Self {
        self.max_output_chars = max;
        self
    }

    /// Register a tool. Replaces any existing tool of the same kind.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        ToolKind::parse(name)
            .and_then(|kind| self.tools.get(&kind))
            .map(|t| t.as_ref())
    }

    /// Tool definitions in a stable order (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL
            .iter()
            .filter_map(|kind| self.tools.get(kind))
            .map(|t| t.to_definition())
            .collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL
            .iter()
            .filter(|kind| self.tools.contains_key(kind))
            .map(|kind| kind.as_str())
            .collect()
    }

    /// Execute a tool call. Every failure mode is folded into the result.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(kind) = ToolKind::parse(&call.name) else {
            return ToolResult::failure(call, &ToolError::UnknownTool(call.name.clone()));
        };
        let Some(tool) = self.tools.get(&kind) else {
            return ToolResult::failure(call, &ToolError::UnknownTool(call.name.clone()));
        };
        if !call.arguments.is_object() {
            return ToolResult::failure(
                call,
                &ToolError::InvalidArguments("arguments must be a JSON object".into()),
            );
        }

        let outcome = tokio::time::timeout(self.call_timeout, tool.execute(call.arguments.clone()))
            .await
            .unwrap_or_else(|_| Err(kind.timeout_error(self.call_timeout)));

        match outcome {
            Ok(payload) => {
                ToolResult::success(call, cap_payload(&payload, self.max_output_chars))
            }
            Err(e) => {
                warn!(tool = %kind, error = %e, "Tool execution failed");
                ToolResult::failure(call, &e)
            }
        }
    }
}

/// Serialize `payload`, keeping it valid JSON when it exceeds `max_chars`:
/// an oversized payload is cut as text and wrapped in a `truncated` envelope.
fn cap_payload(payload: &serde_json::Value, max_chars: usize) -> String {
    let raw = payload.to_string();
    let total = char_len(&raw);
    if total <= max_chars {
        return raw;
    }

    let envelope = |budget: usize| {
        serde_json::json!({ "truncated": true, "text": truncate_with_marker(&raw, budget) }).to_string()
    };
    // Escaping only grows the text, so each pass shrinks the budget by at
    // least the overshoot.
    let mut budget = max_chars;
    loop {
        let wrapped = envelope(budget);
        let len = char_len(&wrapped);
        if len <= max_chars || budget == 0 {
            warn!(original_chars = total, max_chars, "Tool output capped");
            return wrapped;
        }
        budget = budget.saturating_sub(len - max_chars);
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
