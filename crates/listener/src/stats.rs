//! Process-lifetime counters and the periodic status log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Reading the comment stream
    Stream,
    /// Building the transcript
    Context,
    /// Model unavailable or empty reply
    Model,
    /// Posting the reply
    Post,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Context => "context",
            Self::Model => "model",
            Self::Post => "post",
        }
    }
}

/// Counters owned by the consumption loop. Readers get snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub seen: u64,
    pub matched: u64,
    pub duplicates: u64,
    pub posted: u64,
    pub errors: BTreeMap<ErrorCategory, u64>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            seen: 0,
            matched: 0,
            duplicates: 0,
            posted: 0,
            errors: BTreeMap::new(),
            last_activity: None,
        }
    }
}

impl RunStats {
    pub fn record_error(&mut self, category: ErrorCategory) {
        *self.errors.entry(category).or_default() += 1;
        self.touch();
    }

    pub fn errors_in(&self, category: ErrorCategory) -> u64 {
        self.errors.get(&category).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    pub fn touch(&mut self) {
        self.last_activity = Some(Utc::now());
    }

    fn errors_summary(&self) -> String {
        if self.errors.is_empty() {
            return "none".into();
        }
        self.errors
            .iter()
            .map(|(k, v)| format!("{}={v}", k.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Log a stats snapshot every `interval` until `cancel` fires, then once
/// more on the way out.
pub fn spawn_status_reporter(
    stats: watch::Receiver<RunStats>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => log_snapshot(&stats.borrow(), "Status"),
            }
        }
        log_snapshot(&stats.borrow(), "Final status");
    })
}

fn log_snapshot(stats: &RunStats, label: &str) {
    let uptime_secs = (Utc::now() - stats.started_at).num_seconds().max(0);
    info!(
        uptime_secs,
        seen = stats.seen,
        matched = stats.matched,
        duplicates = stats.duplicates,
        posted = stats.posted,
        errors = %stats.errors_summary(),
        last_activity = ?stats.last_activity,
        "{label}"
    );
}
