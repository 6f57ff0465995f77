//! Retry controller
//!
//! Runs a logical operation up to `max_attempts` times with linear backoff,
//! retrying only transient failures. Each operation tracks its state so
//! callers can tell a live result from an exhausted or cancelled one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{Failure, FailureClass};
use crate::config::RetryConfig;

/// Declared retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_step: Duration::from_millis(config.backoff_step_ms),
        }
    }

    /// A policy that never retries
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            backoff_step: Duration::ZERO,
        }
    }

    pub fn should_retry(&self, class: FailureClass) -> bool {
        class.is_transient()
    }

    /// Wait before retry `n` (1-based)
    pub fn delay_before_retry(&self, n: u32) -> Duration {
        self.backoff_step * n
    }
}

/// Lifecycle of one logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Attempting { attempt: u32 },
    Retrying { attempt: u32, wait: Duration },
    /// Transient failures used up every attempt
    Exhausted,
    /// Failed with a non-retryable class
    Failed,
    Success,
    MockFallback,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Success | OperationState::MockFallback | OperationState::Cancelled
        )
    }

    fn allows(self, next: OperationState) -> bool {
        use OperationState::*;
        match (self, next) {
            (Success | MockFallback | Cancelled, _) => false,
            (Exhausted | Failed, MockFallback) => true,
            (Exhausted | Failed, _) => false,
            (Retrying { .. }, Attempting { .. } | Cancelled) => true,
            (Retrying { .. }, _) => false,
            (Attempting { .. }, Attempting { .. } | MockFallback) => false,
            (Attempting { .. }, _) => true,
        }
    }
}

/// Records state transitions of one operation
#[derive(Debug, Clone)]
pub struct OperationTracker {
    name: &'static str,
    history: Vec<OperationState>,
}

impl OperationTracker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> Option<OperationState> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[OperationState] {
        &self.history
    }

    /// Network attempts started so far
    pub fn attempts(&self) -> u32 {
        self.history
            .iter()
            .filter(|s| matches!(s, OperationState::Attempting { .. }))
            .count() as u32
    }

    /// Move to `next`. Returns false and leaves the state alone when the
    /// transition is not allowed.
    pub fn advance(&mut self, next: OperationState) -> bool {
        let allowed = match self.state() {
            None => matches!(
                next,
                OperationState::Attempting { .. }
                    | OperationState::MockFallback
                    | OperationState::Cancelled
            ),
            Some(current) => current.allows(next),
        };
        if allowed {
            debug!(operation = self.name, state = ?next, "Operation state");
            self.history.push(next);
        } else {
            warn!(operation = self.name, from = ?self.state(), to = ?next, "Ignoring invalid state transition");
        }
        allowed
    }
}

/// Cooperative cancellation shared between a caller and running operations
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Sender lives as long as any token clone, so this is unreachable
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Why an operation did not produce a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError {
    #[error(transparent)]
    Failed(Failure),

    #[error("Operation cancelled")]
    Cancelled,
}

pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails with a non-retryable class, runs
    /// out of attempts or is cancelled. `op` receives the 1-based attempt
    /// number.
    pub async fn run<T, F, Fut>(
        &self,
        tracker: &mut OperationTracker,
        cancel: &CancelToken,
        mut op: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                tracker.advance(OperationState::Cancelled);
                return Err(RetryError::Cancelled);
            }
            tracker.advance(OperationState::Attempting { attempt });

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracker.advance(OperationState::Cancelled);
                    return Err(RetryError::Cancelled);
                }
                outcome = op(attempt) => outcome,
            };

            let failure = match outcome {
                Ok(value) => {
                    tracker.advance(OperationState::Success);
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !self.policy.should_retry(failure.class) {
                tracker.advance(OperationState::Failed);
                return Err(RetryError::Failed(failure));
            }

            if attempt == max_attempts {
                warn!(
                    operation = tracker.name,
                    attempts = attempt,
                    class = ?failure.class,
                    "All attempts failed"
                );
                tracker.advance(OperationState::Exhausted);
                return Err(RetryError::Failed(failure));
            }

            let wait = self.policy.delay_before_retry(attempt);
            info!(
                operation = tracker.name,
                attempt = attempt,
                wait_ms = wait.as_millis() as u64,
                class = ?failure.class,
                "Retrying after transient failure"
            );
            tracker.advance(OperationState::Retrying { attempt, wait });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracker.advance(OperationState::Cancelled);
                    return Err(RetryError::Cancelled);
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        // max_attempts >= 1, so the loop always returns
        tracker.advance(OperationState::Exhausted);
        Err(RetryError::Failed(Failure::new(FailureClass::NetworkUnreachable)))
    }
}
