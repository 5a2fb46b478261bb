//! Bounded retry with exponential backoff and jitter.
//!
//! One policy type serves every retrying call site (stream consumption,
//! model API, reply posting, search backend); each site supplies its own
//! parameters and its own notion of which errors are retryable.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry parameters for one call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` means unbounded.
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay_ms: u64,

    /// Growth factor applied per retry
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Ceiling for any single delay
    pub max_delay_ms: u64,

    /// Random extra delay as a fraction of the computed delay (0 disables)
    #[serde(default)]
    pub jitter: f64,
}

fn default_multiplier() -> f64 {
    2.0
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        let base_delay_ms = base_delay.as_millis() as u64;
        Self {
            max_attempts,
            base_delay_ms,
            multiplier: default_multiplier(),
            max_delay_ms: base_delay_ms.saturating_mul(32),
            jitter: 0.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay_ms = max_delay.as_millis() as u64;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Check the parameters; jitter must stay below the growth margin so
    /// consecutive delays never shrink.
    pub fn validate(&self) -> Result<(), String> {
        if self.multiplier < 1.0 {
            return Err(format!("multiplier must be >= 1.0 (got {})", self.multiplier));
        }
        if self.jitter < 0.0 {
            return Err(format!("jitter must be >= 0 (got {})", self.jitter));
        }
        if self.multiplier > 1.0 && self.jitter >= self.multiplier - 1.0 {
            return Err(format!(
                "jitter ({}) must be below multiplier - 1 ({})",
                self.jitter,
                self.multiplier - 1.0
            ));
        }
        if self.multiplier == 1.0 && self.jitter > 0.0 {
            return Err("jitter requires multiplier > 1.0".into());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err("max_delay_ms must be >= base_delay_ms".into());
        }
        Ok(())
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        self.max_attempts == 0 || attempts_made < self.max_attempts
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self.multiplier.powi(retry.min(64) as i32);
        let mut millis = self.base_delay_ms as f64 * exp;
        if self.jitter > 0.0 {
            millis *= 1.0 + self.jitter * rand::random::<f64>();
        }
        let capped = millis.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut op: F,
        retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && self.allows_retry(attempt) => {
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        call = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
