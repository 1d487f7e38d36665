// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Circuit breaker with a count-based sliding window.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  failure rate > threshold  ┌──────┐   cool-down elapsed   ┌──────────┐
//! │ Closed │ ─────────────────────────→ │ Open │ ───────────────────→  │ HalfOpen │
//! └────────┘                            └──────┘ ←── any trial fails ─ └──────────┘
//!      ↑                                                                    │
//!      └─────────────────────── all trial calls succeed ────────────────────┘
//! ```
//!
//! All state sits behind one `parking_lot::Mutex`. Critical sections never
//! span the protected call, so the lock is held for a handful of instructions.
//! Every transition bumps an epoch; outcomes of calls admitted under an older
//! epoch are counted in the totals but do not move the state machine.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::config::{
    ConfigError, CB_FAILURE_RATE_ENV, CB_HALF_OPEN_CALLS_ENV, CB_MINIMUM_CALLS_ENV,
    CB_OPEN_COOLDOWN_ENV, CB_WINDOW_SIZE_ENV, ORDER_CALL_TIMEOUT_ENV,
};

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Breaker tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Failure percentage (0-100] that must be exceeded to open the circuit.
    pub failure_rate_threshold: f64,
    /// Number of most recent calls the failure rate is computed over.
    pub sliding_window_size: usize,
    /// Calls that must be recorded before the failure rate is evaluated.
    pub minimum_calls: usize,
    /// How long the circuit stays open before trial calls are allowed.
    pub open_cooldown: Duration,
    /// Trial calls admitted while half-open; all must succeed to close.
    pub half_open_permitted_calls: u32,
    /// Deadline for a single protected call. Expiry counts as a failure.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 10,
            minimum_calls: 5,
            open_cooldown: Duration::from_secs(30),
            half_open_permitted_calls: 1,
            call_timeout: Duration::from_secs(1),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err(ConfigError::invalid(CB_FAILURE_RATE_ENV, "must be in (0, 100]"));
        }
        if self.sliding_window_size == 0 {
            return Err(ConfigError::invalid(CB_WINDOW_SIZE_ENV, "must be at least 1"));
        }
        if self.minimum_calls == 0 || self.minimum_calls > self.sliding_window_size {
            return Err(ConfigError::invalid(
                CB_MINIMUM_CALLS_ENV,
                "must be between 1 and the sliding window size",
            ));
        }
        if self.open_cooldown.is_zero() {
            return Err(ConfigError::invalid(CB_OPEN_COOLDOWN_ENV, "must be positive"));
        }
        if self.half_open_permitted_calls == 0 {
            return Err(ConfigError::invalid(CB_HALF_OPEN_CALLS_ENV, "must be at least 1"));
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::invalid(ORDER_CALL_TIMEOUT_ENV, "must be positive"));
        }
        Ok(())
    }
}

/// Why a protected call did not produce a value. Handed to the fallback.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    #[error("circuit breaker '{0}' is open")]
    Open(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("call failed: {0}")]
    Failed(E),
}

/// Point-in-time view of a breaker, served by the operational endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    /// Outcomes currently held in the sliding window.
    pub buffered_calls: usize,
    /// Failures currently held in the sliding window.
    pub failed_calls: usize,
    /// Failure percentage of the window, or -1 below the minimum call count.
    pub failure_rate: f64,
    pub not_permitted_calls: u64,
    pub successful_calls_total: u64,
    pub failed_calls_total: u64,
    pub state_transitions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { admitted: u32, succeeded: u32 },
}

impl Phase {
    fn public(self) -> CircuitState {
        match self {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    epoch: u64,
    /// Most recent outcomes, oldest first; `true` marks a failure.
    window: VecDeque<bool>,
    window_failures: usize,

    not_permitted_calls: u64,
    successful_calls_total: u64,
    failed_calls_total: u64,
    state_transitions: u64,
}

impl Inner {
    fn failure_rate(&self, minimum_calls: usize) -> Option<f64> {
        if self.window.len() < minimum_calls {
            return None;
        }
        Some(self.window_failures as f64 * 100.0 / self.window.len() as f64)
    }

    fn reset_window(&mut self) {
        self.window.clear();
        self.window_failures = 0;
    }

    fn transition(&mut self, to: Phase) {
        self.phase = to;
        self.epoch += 1;
        self.state_transitions += 1;
    }
}

/// Thread-safe breaker guarding one named dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let capacity = config.sliding_window_size;
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                epoch: 0,
                window: VecDeque::with_capacity(capacity),
                window_failures: 0,
                not_permitted_calls: 0,
                successful_calls_total: 0,
                failed_calls_total: 0,
                state_transitions: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An open circuit whose cool-down has elapsed still reads
    /// as open until the next call moves it to half-open.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().phase.public()
    }

    /// Run `primary` under the breaker, substituting `fallback` on any failure.
    ///
    /// `primary` is not invoked at all while the circuit is open or while the
    /// half-open trial budget is used up. Dropping the returned future before it
    /// completes cancels the in-flight call and records it as a failure.
    pub async fn run<T, E, P, Fut, F>(&self, primary: P, fallback: F) -> T
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        F: FnOnce(CallError<E>) -> T,
    {
        let Some(permit) = self.try_acquire() else {
            return fallback(CallError::Open(self.name.clone()));
        };

        match tokio::time::timeout(self.config.call_timeout, primary()).await {
            Ok(Ok(value)) => {
                permit.complete(Outcome::Success);
                value
            }
            Ok(Err(err)) => {
                permit.complete(Outcome::Failure);
                fallback(CallError::Failed(err))
            }
            Err(_) => {
                permit.complete(Outcome::Failure);
                fallback(CallError::Timeout(self.config.call_timeout))
            }
        }
    }

    /// Admit a call, or refuse it when the circuit is open or the half-open
    /// trial budget is exhausted.
    fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Closed => {}
            Phase::Open { since } => {
                if since.elapsed() < self.config.open_cooldown {
                    inner.not_permitted_calls += 1;
                    return None;
                }
                inner.transition(Phase::HalfOpen {
                    admitted: 1,
                    succeeded: 0,
                });
                tracing::info!(
                    breaker = %self.name,
                    previous_state = "open",
                    new_state = "half_open",
                    "Circuit breaker cool-down elapsed, admitting trial call"
                );
            }
            Phase::HalfOpen {
                admitted,
                succeeded,
            } => {
                if admitted >= self.config.half_open_permitted_calls {
                    inner.not_permitted_calls += 1;
                    return None;
                }
                inner.phase = Phase::HalfOpen {
                    admitted: admitted + 1,
                    succeeded,
                };
            }
        }
        Some(CallPermit {
            breaker: self,
            epoch: inner.epoch,
            completed: false,
        })
    }

    fn record(&self, epoch: u64, outcome: Outcome) {
        let mut inner = self.inner.lock();
        match outcome {
            Outcome::Success => inner.successful_calls_total += 1,
            Outcome::Failure => inner.failed_calls_total += 1,
        }
        if inner.epoch != epoch {
            return;
        }

        match inner.phase {
            Phase::Closed => {
                let failed = outcome == Outcome::Failure;
                if inner.window.len() == self.config.sliding_window_size {
                    if let Some(true) = inner.window.pop_front() {
                        inner.window_failures -= 1;
                    }
                }
                inner.window.push_back(failed);
                if failed {
                    inner.window_failures += 1;
                }

                if let Some(rate) = inner.failure_rate(self.config.minimum_calls) {
                    if rate > self.config.failure_rate_threshold {
                        inner.transition(Phase::Open {
                            since: Instant::now(),
                        });
                        tracing::warn!(
                            breaker = %self.name,
                            failure_rate = rate,
                            threshold = self.config.failure_rate_threshold,
                            cooldown_secs = self.config.open_cooldown.as_secs(),
                            "Circuit breaker opened"
                        );
                    }
                }
            }
            Phase::HalfOpen {
                admitted,
                succeeded,
            } => match outcome {
                Outcome::Success => {
                    let succeeded = succeeded + 1;
                    if succeeded >= self.config.half_open_permitted_calls {
                        inner.reset_window();
                        inner.transition(Phase::Closed);
                        tracing::info!(
                            breaker = %self.name,
                            previous_state = "half_open",
                            new_state = "closed",
                            "Circuit breaker closed after successful trial calls"
                        );
                    } else {
                        inner.phase = Phase::HalfOpen {
                            admitted,
                            succeeded,
                        };
                    }
                }
                Outcome::Failure => {
                    inner.transition(Phase::Open {
                        since: Instant::now(),
                    });
                    tracing::warn!(
                        breaker = %self.name,
                        previous_state = "half_open",
                        new_state = "open",
                        "Circuit breaker re-opened after failed trial call"
                    );
                }
            },
            // No call is admitted while open under the current epoch.
            Phase::Open { .. } => {}
        }
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.inner.lock();
        CircuitBreakerSnapshot {
            name: self.name.clone(),
            state: inner.phase.public(),
            buffered_calls: inner.window.len(),
            failed_calls: inner.window_failures,
            failure_rate: inner
                .failure_rate(self.config.minimum_calls)
                .unwrap_or(-1.0),
            not_permitted_calls: inner.not_permitted_calls,
            successful_calls_total: inner.successful_calls_total,
            failed_calls_total: inner.failed_calls_total,
            state_transitions: inner.state_transitions,
        }
    }
}

/// Admission ticket for one protected call.
///
/// Dropped without completion (caller went away) counts as a failure.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    epoch: u64,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(mut self, outcome: Outcome) {
        self.completed = true;
        self.breaker.record(self.epoch, outcome);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::debug!(breaker = %self.breaker.name, "Protected call cancelled before completion");
            self.breaker.record(self.epoch, Outcome::Failure);
        }
    }
}
