//! The AI Responder: a bounded tool-calling conversation with the model.
//!
//! ```text
//! AwaitingModel ──text──▶ Done
//!      │  ▲
//! tool │  │ results appended
//! calls▼  │
//! ExecutingTools
//! ```
//!
//! At most `max_tool_steps` model round-trips are made. The last one is
//! sent without tools and with a wrap-up nudge; if the model still asks for
//! tools the loop ends in `Aborted` with a best-effort message.

use crate::prompt::{self, STEP_BUDGET_MESSAGE, WRAP_UP_NUDGE};
use crate::transcript::Transcript;
use chrono::Utc;
use helperbot_config::ModelConfig;
use helperbot_core::error::ProviderError;
use helperbot_core::message::Message;
use helperbot_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use helperbot_core::retry::RetryPolicy;
use helperbot_core::text::truncate_with_marker;
use helperbot_core::tool::{ToolCall, ToolRegistry, ToolResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Log previews of reasoning and assistant text are cut to this length.
const LOG_PREVIEW_CHARS: usize = 1_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    AwaitingModel,
    ExecutingTools,
    Done,
    Aborted,
}

/// Everything exchanged with the model while answering one trigger.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    /// Completed tool-execution rounds
    pub steps: u32,
    pub round_trips: u32,
    pub state: ResponderState,
}

impl ConversationState {
    pub fn new(system: Message, user: Message) -> Self {
        Self {
            messages: vec![system, user],
            steps: 0,
            round_trips: 0,
            state: ResponderState::AwaitingModel,
        }
    }

    /// Number of tool-result messages appended so far.
    pub fn tool_results(&self) -> usize {
        self.messages.iter().filter(|m| m.tool_call_id.is_some()).count()
    }
}

/// The text to post, plus how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// True when the step budget ran out before a final answer
    pub aborted: bool,
    pub round_trips: u32,
    pub steps: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[source] ProviderError),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

pub struct Responder {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    reasoning_effort: Option<String>,
    timeout: Duration,
    max_tool_steps: u32,
    retry: RetryPolicy,
    system_template: String,
}

impl Responder {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            reasoning_effort: None,
            timeout: Duration::from_secs(120),
            max_tool_steps: 16,
            retry: RetryPolicy::new(3, Duration::from_secs(2)),
            system_template: prompt::DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Build from the `[model]` section and the model retry policy.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &ModelConfig,
        retry: RetryPolicy,
    ) -> Self {
        let mut responder = Self::new(provider, tools, config.model.clone())
            .with_timeout(config.timeout())
            .with_max_tool_steps(config.max_tool_steps)
            .with_retry(retry);
        responder.temperature = config.temperature;
        responder.max_tokens = config.max_tokens;
        responder.reasoning_effort = config.reasoning_effort.clone();
        responder
    }

    pub fn with_max_tool_steps(mut self, max: u32) -> Self {
        self.max_tool_steps = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    /// Seed a conversation from a transcript: system prompt plus one user
    /// turn carrying the thread, the question and any images.
    pub fn seed(&self, transcript: &Transcript) -> ConversationState {
        let system = Message::system(prompt::system_prompt(&self.system_template, Utc::now()));
        let user_text = prompt::user_prompt(&transcript.render(), &transcript.question);
        let images = transcript.image_urls();
        if images.is_empty() {
            info!("No images found or included for this thread");
        } else {
            info!(count = images.len(), images = ?images, "Including images in the prompt");
        }
        ConversationState::new(system, Message::user_with_images(user_text, images))
    }

    /// Generate a reply for a transcript.
    pub async fn respond(&self, transcript: &Transcript) -> Result<Reply, ResponderError> {
        let mut state = self.seed(transcript);
        self.run(&mut state).await
    }

    /// Drive `state` until the model produces text or the budget runs out.
    pub async fn run(&self, state: &mut ConversationState) -> Result<Reply, ResponderError> {
        let definitions = self.tools.definitions();
        let mut last_text = String::new();

        loop {
            let final_round = state.round_trips + 1 >= self.max_tool_steps;
            if final_round && state.steps > 0 {
                state.messages.push(Message::system(WRAP_UP_NUDGE));
            }

            state.state = ResponderState::AwaitingModel;
            let tools = if final_round { Vec::new() } else { definitions.clone() };
            let response = match self.call_model(&state.messages, tools).await {
                Ok(r) => r,
                Err(e) => {
                    state.state = ResponderState::Aborted;
                    return Err(e);
                }
            };
            state.round_trips += 1;
            log_response(state.round_trips, &response);

            let text = response.message.content.trim().to_string();
            if !text.is_empty() {
                last_text = text.clone();
            }

            if !response.message.has_tool_calls() {
                state.messages.push(response.message);
                state.state = ResponderState::Done;
                if text.is_empty() {
                    return Err(ResponderError::EmptyReply);
                }
                return Ok(self.reply(state, text, false));
            }

            if final_round {
                state.state = ResponderState::Aborted;
                warn!(
                    round_trips = state.round_trips,
                    steps = state.steps,
                    "Step budget exhausted with tool calls still pending"
                );
                let text = if last_text.is_empty() { STEP_BUDGET_MESSAGE.to_string() } else { last_text };
                return Ok(self.reply(state, text, true));
            }

            state.state = ResponderState::ExecutingTools;
            let calls: Vec<ToolCall> = response.message.tool_calls.iter().map(ToolCall::from).collect();
            state.messages.push(response.message);

            // Sequential, so results are fed back in request order.
            for call in &calls {
                info!(tool = %call.name, arguments = %call.arguments, "Tool call");
                let result = self.tools.dispatch(call).await;
                info!(tool = %call.name, success = result.success, "Tool result: {}", summarize_tool_result(&result));
                state
                    .messages
                    .push(Message::tool_result(result.call_id, result.name, result.output));
            }
            state.steps += 1;
        }
    }

    fn reply(&self, state: &ConversationState, text: String, aborted: bool) -> Reply {
        Reply {
            text,
            aborted,
            round_trips: state.round_trips,
            steps: state.steps,
        }
    }

    async fn call_model(
        &self,
        messages: &[Message],
        tools: Vec<ToolDefinition>,
    ) -> Result<ProviderResponse, ResponderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            reasoning_effort: self.reasoning_effort.clone(),
            timeout: Some(self.timeout),
        };
        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling model"
        );

        self.retry
            .run("model", |_| self.complete_once(request.clone()), ProviderError::is_retryable)
            .await
            .map_err(ResponderError::ModelUnavailable)
    }

    async fn complete_once(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "no response within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

fn log_response(round_trip: u32, response: &ProviderResponse) {
    match response.reasoning.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(reasoning) => info!(round_trip, "Reasoning: {}", truncate_with_marker(reasoning, LOG_PREVIEW_CHARS)),
        None => info!(round_trip, "Reasoning: [not provided by model/provider]"),
    }
    let content = response.message.content.trim();
    if !content.is_empty() {
        info!(round_trip, "Assistant content: {}", truncate_with_marker(content, LOG_PREVIEW_CHARS));
    }
    debug!(
        round_trip,
        finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
        tool_calls = response.message.tool_calls.len(),
        total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
        "Model responded"
    );
}

/// One-line description of a tool result for the logs.
pub fn summarize_tool_result(result: &ToolResult) -> String {
    let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap_or_default();
    if !result.success {
        return format!(
            "error={} message={:?}",
            payload["error"]["kind"].as_str().unwrap_or("unknown"),
            payload["error"]["message"].as_str().unwrap_or_default()
        );
    }
    if payload["truncated"].as_bool() == Some(true) {
        return format!("truncated output_chars={}", result.output.chars().count());
    }
    match result.name.as_str() {
        "web_search" => format!(
            "result_count={} query={:?}",
            payload["result_count"].as_u64().unwrap_or(0),
            payload["query"].as_str().unwrap_or_default()
        ),
        "web_fetch" | "web_render" => format!(
            "status={} text_length={} title={:?}",
            payload["status_code"],
            payload["text_length"],
            payload["title"].as_str().unwrap_or_default()
        ),
        _ => truncate_with_marker(&result.output, 300),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptBuilder;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use helperbot_config::{BotConfig, TranscriptConfig};
    use helperbot_core::error::ToolError;
    use helperbot_core::message::{MessageToolCall, Role};
    use helperbot_core::platform::{Comment, Submission};
    use helperbot_core::tool::{Tool, ToolKind};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays scripted responses; repeats the last one when the script
    /// runs out.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<Message, ProviderError>>>,
        last: Mutex<Option<Result<Message, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Message, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let next = self.script.lock().unwrap().pop_front();
            let step = match next {
                Some(step) => {
                    *self.last.lock().unwrap() = Some(step.clone());
                    step
                }
                None => self.last.lock().unwrap().clone().expect("empty script"),
            };
            step.map(|message| ProviderResponse {
                message,
                usage: None,
                model: "mock-model".into(),
                finish_reason: None,
                reasoning: Some("thinking".into()),
            })
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }
        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            std::future::pending().await
        }
    }

    struct StubTool {
        kind: ToolKind,
        output: Result<serde_json::Value, ToolError>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn kind(&self) -> ToolKind {
            self.kind
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output.clone()
        }
    }

    fn stub(kind: ToolKind, output: Result<serde_json::Value, ToolError>) -> Box<StubTool> {
        Box::new(StubTool { kind, output, calls: AtomicU32::new(0) })
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(stub(
            ToolKind::WebSearch,
            Ok(serde_json::json!({"query": "x", "result_count": 1, "results": [{"url": "https://y.test"}]})),
        ));
        registry.register(stub(
            ToolKind::WebFetch,
            Ok(serde_json::json!({"status_code": 200, "title": "Y", "text": "page", "text_length": 4})),
        ));
        Arc::new(registry)
    }

    fn calls(calls: &[(&str, &str, serde_json::Value)]) -> Message {
        let mut msg = Message::assistant("");
        msg.tool_calls = calls
            .iter()
            .map(|(id, name, args)| MessageToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args.to_string(),
            })
            .collect();
        msg
    }

    fn transcript() -> Transcript {
        let config = TranscriptConfig::default();
        let builder = TranscriptBuilder::new(BotConfig::default().trigger_regex().unwrap(), &config);
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let submission = Submission {
            id: "s".into(),
            author: Some("op".into()),
            subreddit: "rust".into(),
            title: "Title".into(),
            selftext: "Look: https://img.test/a.png".into(),
            is_self: true,
            url: None,
            permalink: "/r/rust/comments/s/t/".into(),
            post_hint: None,
            gallery_images: vec![],
            created_utc: at,
        };
        let trigger = Comment {
            id: "c".into(),
            author: Some("asker".into()),
            body: "@ai what changed in the latest release?".into(),
            parent_id: "t3_s".into(),
            submission_id: "s".into(),
            subreddit: "rust".into(),
            created_utc: at,
        };
        builder.assemble(&submission, &[], &trigger)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn text_only_response_is_done_in_one_round_trip() {
        let provider = ScriptedProvider::new(vec![Ok(Message::assistant("It added async closures."))]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model");

        let mut state = responder.seed(&transcript());
        let reply = responder.run(&mut state).await.unwrap();

        assert_eq!(reply.text, "It added async closures.");
        assert!(!reply.aborted);
        assert_eq!(state.state, ResponderState::Done);
        assert_eq!(provider.calls(), 1);

        let request = &provider.requests.lock().unwrap()[0];
        assert_eq!(request.tools.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[1].content.contains("USER QUESTION (last comment): what changed in the latest release?"));
        assert_eq!(request.messages[1].images, vec!["https://img.test/a.png"]);
    }

    #[tokio::test]
    async fn search_then_fetch_then_text() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&[("call_1", "web_search", serde_json::json!({"query": "x"}))])),
            Ok(calls(&[("call_2", "web_fetch", serde_json::json!({"url": "y"}))])),
            Ok(Message::assistant("Here is the answer.")),
        ]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model");

        let mut state = responder.seed(&transcript());
        let reply = responder.run(&mut state).await.unwrap();

        assert_eq!(reply.text, "Here is the answer.");
        assert_eq!(reply.round_trips, 3);
        assert_eq!(provider.calls(), 3);
        assert_eq!(state.tool_results(), 2);

        let roles: Vec<Role> = state.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(state.messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(state.messages[5].name.as_deref(), Some("web_fetch"));
        assert_eq!(state.messages.last().unwrap().content, "Here is the answer.");
    }

    #[tokio::test]
    async fn results_follow_request_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&[
                ("b", "web_fetch", serde_json::json!({"url": "https://y.test"})),
                ("a", "web_search", serde_json::json!({"query": "x"})),
            ])),
            Ok(Message::assistant("done")),
        ]);
        let responder = Responder::new(provider, registry(), "mock-model");
        let mut state = responder.seed(&transcript());
        responder.run(&mut state).await.unwrap();

        let ids: Vec<_> = state.messages.iter().filter_map(|m| m.tool_call_id.as_deref()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(state.steps, 1);
    }

    #[tokio::test]
    async fn always_tool_model_stops_at_step_bound() {
        let provider = ScriptedProvider::new(vec![Ok(calls(&[("c", "web_search", serde_json::json!({"query": "again"}))]))]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model").with_max_tool_steps(4);

        let mut state = responder.seed(&transcript());
        let reply = responder.run(&mut state).await.unwrap();

        assert!(reply.aborted);
        assert_eq!(reply.text, STEP_BUDGET_MESSAGE);
        assert_eq!(reply.round_trips, 4);
        assert_eq!(provider.calls(), 4);
        assert_eq!(state.state, ResponderState::Aborted);
        assert_eq!(state.tool_results(), 3);

        let requests = provider.requests.lock().unwrap();
        assert!(requests[2].tools.len() == 2);
        assert!(requests[3].tools.is_empty());
        let last = requests[3].messages.last().unwrap();
        assert_eq!(last.role, Role::System);
        assert_eq!(last.content, WRAP_UP_NUDGE);
    }

    #[tokio::test]
    async fn aborted_reply_prefers_last_assistant_text() {
        let mut msg = calls(&[("c", "web_search", serde_json::json!({"query": "x"}))]);
        msg.content = "Partial answer: probably 1.85.".into();
        let provider = ScriptedProvider::new(vec![Ok(msg)]);
        let responder = Responder::new(provider, registry(), "mock-model").with_max_tool_steps(2);

        let reply = responder.respond(&transcript()).await.unwrap();
        assert!(reply.aborted);
        assert_eq!(reply.text, "Partial answer: probably 1.85.");
    }

    #[tokio::test]
    async fn wrap_up_round_can_still_answer() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&[("c1", "web_search", serde_json::json!({"query": "x"}))])),
            Ok(Message::assistant("Best effort answer.")),
        ]);
        let responder = Responder::new(provider, registry(), "mock-model").with_max_tool_steps(2);
        let reply = responder.respond(&transcript()).await.unwrap();
        assert!(!reply.aborted);
        assert_eq!(reply.text, "Best effort answer.");
    }

    #[tokio::test]
    async fn failing_tool_becomes_failure_payload() {
        let mut registry = ToolRegistry::new();
        registry.register(stub(
            ToolKind::WebSearch,
            Err(ToolError::SearchUnavailable("connection refused".into())),
        ));
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&[("c1", "web_search", serde_json::json!({"query": "x"}))])),
            Ok(Message::assistant("Search is down, but from memory: ...")),
        ]);
        let responder = Responder::new(provider, Arc::new(registry), "mock-model");

        let mut state = responder.seed(&transcript());
        let reply = responder.run(&mut state).await.unwrap();

        assert_eq!(reply.round_trips, 2);
        let tool_msg = state.messages.iter().find(|m| m.role == Role::Tool).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&tool_msg.content).unwrap();
        assert_eq!(payload["error"]["kind"], "search_unavailable");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_model() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&[("c1", "web_open_url", serde_json::json!({"url": "x"}))])),
            Ok(Message::assistant("ok")),
        ]);
        let responder = Responder::new(provider, registry(), "mock-model");
        let mut state = responder.seed(&transcript());
        responder.run(&mut state).await.unwrap();

        let tool_msg = state.messages.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_msg.content.contains("unknown_tool"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_model_failures_are_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Network("reset".into())),
            Ok(Message::assistant("recovered")),
        ]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model").with_retry(fast_retry());
        let reply = responder.respond(&transcript()).await.unwrap();
        assert_eq!(reply.text, "recovered");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_model_unavailable() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        })]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model").with_retry(fast_retry());

        let mut state = responder.seed(&transcript());
        let err = responder.run(&mut state).await.unwrap_err();
        assert!(matches!(err, ResponderError::ModelUnavailable(_)));
        assert_eq!(provider.calls(), 3);
        assert_eq!(state.state, ResponderState::Aborted);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::AuthenticationFailed("bad key".into()))]);
        let responder = Responder::new(provider.clone(), registry(), "mock-model").with_retry(fast_retry());
        let err = responder.respond(&transcript()).await.unwrap_err();
        assert!(matches!(err, ResponderError::ModelUnavailable(ProviderError::AuthenticationFailed(_))));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_model_times_out() {
        let responder = Responder::new(Arc::new(HangingProvider), registry(), "mock-model")
            .with_timeout(Duration::from_secs(5))
            .with_retry(RetryPolicy::new(2, Duration::from_secs(1)));
        let err = responder.respond(&transcript()).await.unwrap_err();
        assert!(matches!(err, ResponderError::ModelUnavailable(ProviderError::Timeout(_))));
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let provider = ScriptedProvider::new(vec![Ok(Message::assistant("   "))]);
        let responder = Responder::new(provider, registry(), "mock-model");
        let err = responder.respond(&transcript()).await.unwrap_err();
        assert!(matches!(err, ResponderError::EmptyReply));
    }

    #[test]
    fn tool_result_summaries() {
        let call = ToolCall {
            id: "1".into(),
            name: "web_search".into(),
            arguments: serde_json::json!({}),
        };
        let ok = ToolResult::success(&call, r#"{"query":"rust","result_count":3,"results":[]}"#);
        assert_eq!(summarize_tool_result(&ok), "result_count=3 query=\"rust\"");

        let failed = ToolResult::failure(&call, &ToolError::SearchUnavailable("down".into()));
        assert!(summarize_tool_result(&failed).starts_with("error=search_unavailable"));

        let fetch_call = ToolCall { name: "web_fetch".into(), ..call };
        let page = ToolResult::success(&fetch_call, r#"{"status_code":200,"text_length":42,"title":"T"}"#);
        assert_eq!(summarize_tool_result(&page), "status=200 text_length=42 title=\"T\"");

        let capped = ToolResult::success(&fetch_call, r#"{"truncated":true,"text":"{\"status"}"#);
        assert!(summarize_tool_result(&capped).starts_with("truncated output_chars="));
    }
}
