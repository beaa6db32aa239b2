//! Exponential backoff for transient driver failures

use crate::clock::Clock;
use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest single wait between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Wait before retry `n` (0-based) is `base^n` seconds plus jitter
    pub base: f64,
    pub max_jitter_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base: 2.0,
            max_jitter_secs: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Run `op` once, never retrying.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".into());
        }
        if !(self.base.is_finite() && self.base >= 1.0) {
            return Err("base must be a finite number >= 1".into());
        }
        if !(self.max_jitter_secs.is_finite() && self.max_jitter_secs >= 0.0) {
            return Err("max_jitter_secs must be a finite number >= 0".into());
        }
        Ok(())
    }

    /// Wait before retry `attempt`, capped at [`MAX_BACKOFF`].
    pub fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.max_jitter_secs > 0.0 && self.max_jitter_secs.is_finite() {
            rng.gen_range(0.0..self.max_jitter_secs)
        } else {
            0.0
        };
        let secs = self.base.powi(attempt.min(i32::MAX as u32) as i32) + jitter;
        Duration::try_from_secs_f64(secs.max(0.0))
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    /// Call `op` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. The last error is returned as-is.
    pub fn run<T, C, R, F>(&self, clock: &C, rng: &mut R, what: &str, mut op: F) -> Result<T>
    where
        C: Clock + ?Sized,
        R: Rng + ?Sized,
        F: FnMut() -> Result<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let wait = self.backoff(attempt, rng);
                    tracing::warn!(
                        operation = what,
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs_f64(),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    clock.sleep(wait);
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(operation = what, attempts, error = %e, "Final attempt failed");
                    }
                    return Err(e);
                }
            }
        }
    }
}
