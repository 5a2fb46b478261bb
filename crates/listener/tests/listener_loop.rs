use async_trait::async_trait;
use chrono::Utc;
use helperbot_agent::{Responder, TranscriptBuilder};
use helperbot_config::{BotConfig, TranscriptConfig};
use helperbot_core::error::{PlatformError, ProviderError};
use helperbot_core::message::Message;
use helperbot_core::platform::{Comment, Platform, StreamItem, Submission};
use helperbot_core::provider::{Provider, ProviderRequest, ProviderResponse};
use helperbot_core::retry::RetryPolicy;
use helperbot_core::tool::ToolRegistry;
use helperbot_listener::{ErrorCategory, Listener, ListenerError, TriggerFilter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const BOT: &str = "helperbot";

fn comment(id: &str, author: &str, body: &str) -> Comment {
    Comment {
        id: id.into(),
        author: Some(author.into()),
        body: body.into(),
        parent_id: "t3_sub1".into(),
        submission_id: "sub1".into(),
        subreddit: "rust".into(),
        created_utc: Utc::now(),
    }
}

fn trigger(id: &str) -> Comment {
    comment(id, "alice", "@grok what is this?")
}

/// Plays back a scripted stream; cancels the run once the script is
/// exhausted.
struct MockPlatform {
    stream: Mutex<VecDeque<Result<Comment, PlatformError>>>,
    reply_failures: Mutex<VecDeque<PlatformError>>,
    submission_error: Option<PlatformError>,
    reads: Mutex<Vec<Instant>>,
    replies: Mutex<Vec<(String, String, Instant)>>,
    reply_attempts: Mutex<u32>,
    done: CancellationToken,
}

impl MockPlatform {
    fn new(stream: Vec<Result<Comment, PlatformError>>, done: CancellationToken) -> Self {
        Self {
            stream: Mutex::new(stream.into()),
            reply_failures: Mutex::new(VecDeque::new()),
            submission_error: None,
            reads: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            reply_attempts: Mutex::new(0),
            done,
        }
    }

    fn failing_replies(self, failures: Vec<PlatformError>) -> Self {
        *self.reply_failures.lock().unwrap() = failures.into();
        self
    }

    fn failing_submission(mut self, error: PlatformError) -> Self {
        self.submission_error = Some(error);
        self
    }

    fn replies(&self) -> Vec<(String, String)> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(id, text, _)| (id.clone(), text.clone()))
            .collect()
    }

    /// Gaps between consecutive stream reads.
    fn read_gaps(&self) -> Vec<Duration> {
        let reads = self.reads.lock().unwrap();
        reads.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    fn bot_username(&self) -> &str {
        BOT
    }

    async fn next_comment(&self) -> Result<StreamItem, PlatformError> {
        self.reads.lock().unwrap().push(Instant::now());
        let next = self.stream.lock().unwrap().pop_front();
        match next {
            Some(item) => item,
            None => {
                self.done.cancel();
                std::future::pending().await
            }
        }
    }

    async fn comment(&self, id: &str) -> Result<Comment, PlatformError> {
        Err(PlatformError::NotFound(id.into()))
    }

    async fn submission(&self, id: &str) -> Result<Submission, PlatformError> {
        if let Some(e) = &self.submission_error {
            return Err(e.clone());
        }
        Ok(Submission {
            id: id.into(),
            author: Some("op".into()),
            subreddit: "rust".into(),
            title: "What is this crab?".into(),
            selftext: "Found it on the beach.".into(),
            is_self: true,
            permalink: format!("/r/rust/comments/{id}/crab/"),
            ..Submission::default()
        })
    }

    async fn reply(&self, comment_id: &str, text: &str) -> Result<String, PlatformError> {
        *self.reply_attempts.lock().unwrap() += 1;
        if let Some(e) = self.reply_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        let mut replies = self.replies.lock().unwrap();
        replies.push((comment_id.into(), text.into(), Instant::now()));
        Ok(format!("r{}", replies.len()))
    }
}

enum Behaviour {
    Answer(&'static str),
    Fail(ProviderError),
    Hang,
}

struct MockProvider {
    behaviour: Behaviour,
    calls: Mutex<u32>,
}

impl MockProvider {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        match &self.behaviour {
            Behaviour::Answer(text) => Ok(ProviderResponse {
                message: Message::assistant(*text),
                usage: None,
                model: "mock-model".into(),
                finish_reason: Some("stop".into()),
                reasoning: None,
            }),
            Behaviour::Fail(e) => Err(e.clone()),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

fn listener(platform: Arc<MockPlatform>, provider: Arc<MockProvider>) -> Listener {
    let bot = BotConfig {
        subreddits: vec!["rust".into()],
        ..BotConfig::default()
    };
    let filter = TriggerFilter::from_config(&bot, BOT).unwrap();
    let builder = TranscriptBuilder::new(bot.trigger_regex().unwrap(), &TranscriptConfig::default());
    let responder = Responder::new(provider, Arc::new(ToolRegistry::new()), "mock-model")
        .with_retry(RetryPolicy::new(2, Duration::from_millis(100)));
    Listener::new(platform, filter, builder, responder)
        .with_rate_limit(Duration::ZERO)
        .with_post_retry(RetryPolicy::new(3, Duration::from_secs(1)))
}

#[tokio::test(start_paused = true)]
async fn matching_comment_gets_one_reply() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![
            Ok(comment("c0", "bob", "nice crab")),
            Ok(trigger("c1")),
            Ok(comment("c2", BOT, "@grok talking to myself")),
        ],
        done.clone(),
    ));
    let provider = MockProvider::new(Behaviour::Answer("It is a coconut crab."));
    let mut listener = listener(platform.clone(), provider);

    listener.run(done).await.unwrap();

    assert_eq!(platform.replies(), vec![("c1".to_string(), "It is a coconut crab.".to_string())]);
    let stats = listener.stats();
    assert_eq!(stats.seen, 3);
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.posted, 1);
    assert_eq!(stats.total_errors(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_comment_is_answered_once() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(vec![Ok(trigger("c1")), Ok(trigger("c1"))], done.clone()));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("Once.")));

    listener.run(done).await.unwrap();

    assert_eq!(platform.replies().len(), 1);
    assert_eq!(listener.stats().duplicates, 1);
}

#[tokio::test(start_paused = true)]
async fn transient_stream_errors_back_off_then_resume() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![
            Err(PlatformError::ConnectionLost("reset".into())),
            Err(PlatformError::ConnectionLost("reset".into())),
            Err(PlatformError::Server {
                status_code: 503,
                message: "unavailable".into(),
            }),
            Ok(trigger("c1")),
        ],
        done.clone(),
    ));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("Back.")))
        .with_stream_retry(RetryPolicy::new(0, Duration::from_secs(10)).with_max_delay(Duration::from_secs(300)));
    let stats = listener.subscribe();

    listener.run(done).await.unwrap();

    let gaps = platform.read_gaps();
    let backoffs = &gaps[..3];
    assert_eq!(
        backoffs,
        &[Duration::from_secs(10), Duration::from_secs(20), Duration::from_secs(40)]
    );
    assert!(backoffs.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(listener.stats().errors_in(ErrorCategory::Stream), 3);
    assert_eq!(stats.borrow().errors_in(ErrorCategory::Stream), 3);
    assert_eq!(platform.replies().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn platform_rate_limit_waits_at_least_retry_after() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![Err(PlatformError::RateLimited { retry_after_secs: 90 }), Ok(trigger("c1"))],
        done.clone(),
    ));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("ok")));

    listener.run(done).await.unwrap();

    assert!(platform.read_gaps()[0] >= Duration::from_secs(90));
}

#[tokio::test(start_paused = true)]
async fn unauthorized_stream_is_fatal() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![Err(PlatformError::Unauthorized("bad password".into())), Ok(trigger("c1"))],
        done.clone(),
    ));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("never")));

    let err = listener.run(done).await.unwrap_err();
    assert!(matches!(err, ListenerError::Fatal(PlatformError::Unauthorized(_))));
    assert!(platform.replies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_listing_backs_off_and_keeps_listening() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![
            Err(PlatformError::NotFound("r/typo listing".into())),
            Err(PlatformError::Rejected("400: bad listing".into())),
            Ok(trigger("c1")),
        ],
        done.clone(),
    ));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("still here")));

    listener.run(done).await.unwrap();

    assert_eq!(platform.replies().len(), 1);
    assert_eq!(platform.replies()[0].0, "c1");
    assert_eq!(listener.stats().errors_in(ErrorCategory::Stream), 2);
    let gaps = platform.read_gaps();
    assert!(gaps[0] >= Duration::from_secs(10));
    assert!(gaps[1] >= gaps[0]);
}

#[tokio::test(start_paused = true)]
async fn bounded_stream_retry_gives_up() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(
        vec![
            Err(PlatformError::ConnectionLost("down".into())),
            Err(PlatformError::ConnectionLost("down".into())),
        ],
        done.clone(),
    ));
    let mut listener = listener(platform, MockProvider::new(Behaviour::Answer("never")))
        .with_stream_retry(RetryPolicy::new(2, Duration::from_secs(1)));

    let err = listener.run(done).await.unwrap_err();
    assert!(matches!(err, ListenerError::StreamExhausted { attempts: 2, .. }));
}

#[tokio::test(start_paused = true)]
async fn unavailable_context_is_skipped() {
    let done = CancellationToken::new();
    let platform = Arc::new(
        MockPlatform::new(vec![Ok(trigger("c1"))], done.clone())
            .failing_submission(PlatformError::NotFound("t3_sub1".into())),
    );
    let provider = MockProvider::new(Behaviour::Answer("never"));
    let mut listener = listener(platform.clone(), provider.clone());

    listener.run(done).await.unwrap();

    assert!(platform.replies().is_empty());
    assert_eq!(*provider.calls.lock().unwrap(), 0);
    assert_eq!(listener.stats().errors_in(ErrorCategory::Context), 1);
}

#[tokio::test(start_paused = true)]
async fn unavailable_model_is_skipped_without_posting() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(vec![Ok(trigger("c1")), Ok(trigger("c2"))], done.clone()));
    let provider = MockProvider::new(Behaviour::Fail(ProviderError::Network("connection refused".into())));
    let mut listener = listener(platform.clone(), provider.clone());

    listener.run(done).await.unwrap();

    assert!(platform.replies().is_empty());
    // two triggers, two attempts each
    assert_eq!(*provider.calls.lock().unwrap(), 4);
    assert_eq!(listener.stats().errors_in(ErrorCategory::Model), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_post_failure_is_retried() {
    let done = CancellationToken::new();
    let platform = Arc::new(
        MockPlatform::new(vec![Ok(trigger("c1"))], done.clone()).failing_replies(vec![PlatformError::Server {
            status_code: 500,
            message: "oops".into(),
        }]),
    );
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("Second time lucky.")));

    listener.run(done).await.unwrap();

    assert_eq!(platform.replies().len(), 1);
    assert_eq!(*platform.reply_attempts.lock().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn rejected_post_is_skipped_not_retried() {
    let done = CancellationToken::new();
    let platform = Arc::new(
        MockPlatform::new(vec![Ok(trigger("c1"))], done.clone())
            .failing_replies(vec![PlatformError::Rejected("THREAD_LOCKED: locked".into())]),
    );
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("Too late.")));

    listener.run(done).await.unwrap();

    assert!(platform.replies().is_empty());
    assert_eq!(*platform.reply_attempts.lock().unwrap(), 1);
    assert_eq!(listener.stats().errors_in(ErrorCategory::Post), 1);
}

#[tokio::test(start_paused = true)]
async fn posts_are_spaced_by_rate_limit_and_carry_footer() {
    let done = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(vec![Ok(trigger("c1")), Ok(trigger("c2"))], done.clone()));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Answer("Answer.")))
        .with_rate_limit(Duration::from_secs(10))
        .with_footer(Some("^(I am a bot.)".into()));

    listener.run(done).await.unwrap();

    let replies = platform.replies.lock().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].1, "Answer.\n\n---\n^(I am a bot.)");
    assert!(replies[1].2 - replies[0].2 >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_in_flight_dispatch() {
    let cancel = CancellationToken::new();
    let platform = Arc::new(MockPlatform::new(vec![Ok(trigger("c1"))], CancellationToken::new()));
    let mut listener = listener(platform.clone(), MockProvider::new(Behaviour::Hang));

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        stopper.cancel();
    });

    let started = Instant::now();
    listener.run(cancel).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(platform.replies().is_empty());
    assert_eq!(listener.stats().matched, 1);
}
