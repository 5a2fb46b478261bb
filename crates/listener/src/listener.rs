//! The consumption loop: one comment at a time, from stream read to
//! posted reply.

use crate::filter::{TriggerFilter, Verdict};
use crate::stats::{ErrorCategory, RunStats};
use helperbot_agent::{Reply, Responder, ResponderError, TranscriptBuilder};
use helperbot_config::AppConfig;
use helperbot_core::error::{ContextError, PlatformError};
use helperbot_core::platform::{Comment, Platform};
use helperbot_core::retry::RetryPolicy;
use helperbot_core::seen::SeenWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Credential or permission failure against the platform.
    #[error("Fatal platform error: {0}")]
    Fatal(#[source] PlatformError),

    #[error("Comment stream still failing after {attempts} attempts: {source}")]
    StreamExhausted {
        attempts: u32,
        #[source]
        source: PlatformError,
    },
}

/// Why one trigger produced no reply.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Model(#[from] ResponderError),

    #[error("Posting failed: {0}")]
    Post(#[source] PlatformError),
}

impl DispatchError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Context(_) => ErrorCategory::Context,
            Self::Model(_) => ErrorCategory::Model,
            Self::Post(_) => ErrorCategory::Post,
        }
    }
}

pub struct Listener {
    platform: Arc<dyn Platform>,
    filter: TriggerFilter,
    builder: TranscriptBuilder,
    responder: Responder,
    handled: SeenWindow,
    stats: RunStats,
    stats_tx: watch::Sender<RunStats>,
    rate_limit: Duration,
    stream_retry: RetryPolicy,
    post_retry: RetryPolicy,
    footer: Option<String>,
}

impl Listener {
    pub fn new(
        platform: Arc<dyn Platform>,
        filter: TriggerFilter,
        builder: TranscriptBuilder,
        responder: Responder,
    ) -> Self {
        let stats = RunStats::default();
        let (stats_tx, _) = watch::channel(stats.clone());
        Self {
            platform,
            filter,
            builder,
            responder,
            handled: SeenWindow::new(10_000),
            stats,
            stats_tx,
            rate_limit: Duration::from_secs(10),
            stream_retry: RetryPolicy::new(0, Duration::from_secs(10)).with_max_delay(Duration::from_secs(300)),
            post_retry: RetryPolicy::new(3, Duration::from_secs(2)),
            footer: None,
        }
    }

    /// Apply the `[bot]` and `[retry]` sections.
    pub fn configure(self, config: &AppConfig) -> Self {
        self.with_rate_limit(config.bot.rate_limit())
            .with_dedup_capacity(config.bot.dedup_capacity)
            .with_stream_retry(config.retry.stream.clone())
            .with_post_retry(config.retry.post.clone())
            .with_footer(config.bot.reply_footer.clone())
    }

    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_dedup_capacity(mut self, capacity: usize) -> Self {
        self.handled = SeenWindow::new(capacity);
        self
    }

    pub fn with_stream_retry(mut self, policy: RetryPolicy) -> Self {
        self.stream_retry = policy;
        self
    }

    pub fn with_post_retry(mut self, policy: RetryPolicy) -> Self {
        self.post_retry = policy;
        self
    }

    pub fn with_footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Snapshots of [`RunStats`], updated after every change.
    pub fn subscribe(&self) -> watch::Receiver<RunStats> {
        self.stats_tx.subscribe()
    }

    /// Consume the stream until `cancel` fires or a fatal error occurs.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ListenerError> {
        info!(
            platform = self.platform.name(),
            bot = self.platform.bot_username(),
            trigger = self.filter.trigger().as_str(),
            "Listening for triggers"
        );

        let mut failures: u32 = 0;
        let mut last_delay = Duration::ZERO;

        loop {
            let item = tokio::select! {
                () = cancel.cancelled() => break,
                item = self.platform.next_comment() => item,
            };

            match item {
                Ok(comment) => {
                    if failures > 0 {
                        info!(failures, "Comment stream recovered");
                        failures = 0;
                        last_delay = Duration::ZERO;
                    }
                    self.handle(comment, &cancel).await?;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Not authorized to read the comment stream");
                    return Err(ListenerError::Fatal(e));
                }
                Err(e) => {
                    failures += 1;
                    self.stats.record_error(ErrorCategory::Stream);
                    self.publish();
                    if !self.stream_retry.allows_retry(failures) {
                        error!(attempts = failures, error = %e, "Giving up on the comment stream");
                        return Err(ListenerError::StreamExhausted {
                            attempts: failures,
                            source: e,
                        });
                    }

                    let mut delay = self.stream_retry.delay_for(failures - 1);
                    if let PlatformError::RateLimited { retry_after_secs } = e {
                        delay = delay.max(Duration::from_secs(retry_after_secs));
                    }
                    delay = delay.max(last_delay);
                    last_delay = delay;
                    warn!(
                        attempt = failures,
                        transient = e.is_transient(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Comment stream error, backing off"
                    );
                    if !sleep_or_cancel(delay, &cancel).await {
                        break;
                    }
                }
            }
        }

        info!(seen = self.stats.seen, posted = self.stats.posted, "Listener stopped");
        Ok(())
    }

    /// Filter, dedup and dispatch one stream item.
    async fn handle(&mut self, comment: Comment, cancel: &CancellationToken) -> Result<(), ListenerError> {
        self.stats.seen += 1;
        self.stats.touch();

        match self.filter.check(&comment) {
            Verdict::Matched => {}
            Verdict::OwnComment => {
                debug!(comment_id = %comment.id, "Ignoring own comment");
                self.publish();
                return Ok(());
            }
            _ => {
                self.publish();
                return Ok(());
            }
        }

        if !self.handled.insert(&comment.id) {
            debug!(comment_id = %comment.id, "Already handled, skipping");
            self.stats.duplicates += 1;
            self.publish();
            return Ok(());
        }
        self.stats.matched += 1;
        self.publish();
        info!(
            comment_id = %comment.id,
            subreddit = %comment.subreddit,
            author = comment.author.as_deref().unwrap_or("[deleted]"),
            "Trigger matched"
        );

        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            outcome = self.dispatch(&comment) => Some(outcome),
        };

        match outcome {
            None => {
                info!(comment_id = %comment.id, "Shutdown during dispatch, reply abandoned");
                Ok(())
            }
            Some(Ok(reply_id)) => {
                self.stats.posted += 1;
                self.stats.touch();
                self.publish();
                info!(comment_id = %comment.id, reply_id = %reply_id, "Reply posted");
                if !self.rate_limit.is_zero() {
                    debug!(secs = self.rate_limit.as_secs_f64(), "Rate limit pause");
                    sleep_or_cancel(self.rate_limit, cancel).await;
                }
                Ok(())
            }
            Some(Err(DispatchError::Post(e))) if e.is_fatal() => {
                self.stats.record_error(ErrorCategory::Post);
                self.publish();
                error!(comment_id = %comment.id, error = %e, "Not authorized to post");
                Err(ListenerError::Fatal(e))
            }
            Some(Err(e)) => {
                self.stats.record_error(e.category());
                self.publish();
                warn!(
                    comment_id = %comment.id,
                    category = e.category().as_str(),
                    error = %e,
                    "Skipping trigger"
                );
                Ok(())
            }
        }
    }

    /// Transcript, reply, post. Returns the id of the posted reply.
    async fn dispatch(&self, comment: &Comment) -> Result<String, DispatchError> {
        let transcript = self.builder.build(self.platform.as_ref(), comment).await?;
        debug!(
            comment_id = %comment.id,
            turns = transcript.turns.len(),
            omitted = transcript.omitted,
            chars = transcript.rendered_len(),
            "Transcript built"
        );

        let reply = self.responder.respond(&transcript).await?;
        if reply.aborted {
            warn!(comment_id = %comment.id, steps = reply.steps, "Posting best-effort reply after step budget");
        }
        let body = self.compose(&reply);

        self.post_retry
            .run(
                "post",
                |_| self.platform.reply(&comment.id, &body),
                PlatformError::is_transient,
            )
            .await
            .map_err(DispatchError::Post)
    }

    fn compose(&self, reply: &Reply) -> String {
        match &self.footer {
            Some(footer) => format!("{}\n\n---\n{}", reply.text, footer.trim()),
            None => reply.text.clone(),
        }
    }

    fn publish(&self) {
        self.stats_tx.send_replace(self.stats.clone());
    }
}

/// Sleep unless cancelled first. Returns false on cancellation.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
