// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use brain_atlas_config::RetryConfig;
use tracing::warn;

use crate::types::ServiceResult;

/// Retry contract for network calls
///
/// A call is attempted at most `max_attempts` times. Only transient errors
/// (see [`crate::ServiceError::is_transient`]) are retried; the wait before
/// attempt `n + 1` is `backoff_step * n`. The last error is returned once
/// attempts are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_step: Duration::from_secs(config.backoff_step_secs),
        }
    }
}

impl RetryPolicy {
    /// No retries, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_step: Duration::ZERO,
        }
    }

    /// Wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Run `call` under this policy
    ///
    /// `operation` only labels the retry warnings.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> ServiceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        target: "brain-atlas-services",
                        "Retry {}/{} for {} after {}, waiting {:?}",
                        attempt,
                        self.max_attempts,
                        operation,
                        err,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
