//! Per-source circuit breaker.
//!
//! A source starts closed. Consecutive transient or rate-limit failures open
//! it for a cooldown; after the cooldown exactly one probe is admitted. A
//! successful probe closes the circuit and restores the base cooldown; a
//! failed probe reopens it with the cooldown doubled, capped at
//! `max_cooldown`. A probe that never reports back is considered stale after
//! one cooldown and another probe is admitted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use prospect_core::{CircuitBreakerConfig, ProspectError, SourceKey};
use serde::Serialize;
use tokio::time::Instant;

use crate::deadline_after;

/// Externally visible phase of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitPhase {
    /// Requests flow normally.
    Closed,
    /// Requests are rejected until the cooldown elapses.
    Open,
    /// The cooldown elapsed; a single probe decides whether to close again.
    HalfOpen,
}

/// Point-in-time view of one source's circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitSnapshot {
    /// Current phase.
    pub phase: CircuitPhase,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Open period used the next time the circuit opens from half-open.
    pub cooldown: Duration,
    /// Time until a probe is admitted, while open.
    pub reset_in: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { until: Instant },
    HalfOpen { probe_started: Instant },
}

#[derive(Debug, Clone, Copy)]
struct CircuitState {
    phase: Phase,
    consecutive_failures: u32,
    cooldown: Duration,
}

impl CircuitState {
    const fn new(cooldown: Duration) -> Self {
        Self {
            phase: Phase::Closed,
            consecutive_failures: 0,
            cooldown,
        }
    }
}

/// Circuit breakers for every source, created lazily in the closed phase.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    states: Mutex<HashMap<SourceKey, CircuitState>>,
}

impl CircuitBreaker {
    /// Create a breaker with the given thresholds.
    #[must_use]
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }

    fn open_error(source: SourceKey, reset_in: Duration) -> ProspectError {
        ProspectError::CircuitOpen {
            source_name: source.to_string(),
            reset_in_ms: u64::try_from(reset_in.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Whether a call to `source` would be admitted right now, without admitting it.
    ///
    /// # Errors
    /// Returns `CircuitOpen` with the time until a probe would be admitted.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn peek(&self, source: SourceKey) -> Result<(), ProspectError> {
        let states = self.states.lock().expect("mutex poisoned");
        let Some(state) = states.get(&source) else {
            return Ok(());
        };
        let now = Instant::now();
        match state.phase {
            Phase::Closed => Ok(()),
            Phase::Open { until } if now < until => Err(Self::open_error(source, until - now)),
            Phase::Open { .. } => Ok(()),
            Phase::HalfOpen { probe_started } => {
                let stale_at = deadline_after(probe_started, state.cooldown);
                if now < stale_at {
                    Err(Self::open_error(source, stale_at - now))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Admit a call to `source`.
    ///
    /// While open, calls are rejected. Once the cooldown has elapsed the first
    /// caller becomes the half-open probe and later callers are rejected until
    /// the probe reports or goes stale.
    ///
    /// # Errors
    /// Returns `CircuitOpen` with the time until a probe would be admitted.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn check(&self, source: SourceKey) -> Result<(), ProspectError> {
        let mut states = self.states.lock().expect("mutex poisoned");
        let Some(state) = states.get_mut(&source) else {
            return Ok(());
        };
        let now = Instant::now();
        match state.phase {
            Phase::Closed => Ok(()),
            Phase::Open { until } if now < until => Err(Self::open_error(source, until - now)),
            Phase::Open { .. } => {
                #[cfg(feature = "tracing")]
                tracing::info!(source = %source, "circuit half-open, admitting probe");
                state.phase = Phase::HalfOpen { probe_started: now };
                Ok(())
            }
            Phase::HalfOpen { probe_started } => {
                let stale_at = deadline_after(probe_started, state.cooldown);
                if now < stale_at {
                    Err(Self::open_error(source, stale_at - now))
                } else {
                    state.phase = Phase::HalfOpen { probe_started: now };
                    Ok(())
                }
            }
        }
    }

    /// Record that `source` answered. Closes the circuit and resets failure accounting.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn record_success(&self, source: SourceKey) {
        let mut states = self.states.lock().expect("mutex poisoned");
        if let Some(state) = states.get_mut(&source) {
            #[cfg(feature = "tracing")]
            {
                if !matches!(state.phase, Phase::Closed) {
                    tracing::info!(source = %source, "circuit closed");
                }
            }
            *state = CircuitState::new(self.cfg.cooldown);
        }
    }

    /// Record a transient or rate-limit failure of `source`.
    ///
    /// Opens the circuit when the failure threshold is reached, and reopens
    /// it with a doubled cooldown when a half-open probe fails.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn record_failure(&self, source: SourceKey) {
        let mut states = self.states.lock().expect("mutex poisoned");
        let state = states
            .entry(source)
            .or_insert_with(|| CircuitState::new(self.cfg.cooldown));
        let now = Instant::now();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        match state.phase {
            Phase::Closed => {
                if state.consecutive_failures >= self.cfg.failure_threshold {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        source = %source,
                        failures = state.consecutive_failures,
                        cooldown_ms = u64::try_from(state.cooldown.as_millis()).unwrap_or(u64::MAX),
                        "circuit opened"
                    );
                    state.phase = Phase::Open {
                        until: deadline_after(now, state.cooldown),
                    };
                }
            }
            Phase::HalfOpen { .. } => {
                state.cooldown = state
                    .cooldown
                    .saturating_mul(2)
                    .min(self.cfg.max_cooldown.max(self.cfg.cooldown));
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    source = %source,
                    cooldown_ms = u64::try_from(state.cooldown.as_millis()).unwrap_or(u64::MAX),
                    "probe failed, circuit reopened"
                );
                state.phase = Phase::Open {
                    until: deadline_after(now, state.cooldown),
                };
            }
            // Late failure of a call admitted before the circuit opened.
            Phase::Open { .. } => {}
        }
    }

    /// Current state of `source`'s circuit.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn snapshot(&self, source: SourceKey) -> CircuitSnapshot {
        let states = self.states.lock().expect("mutex poisoned");
        let state = states
            .get(&source)
            .copied()
            .unwrap_or_else(|| CircuitState::new(self.cfg.cooldown));
        let now = Instant::now();
        let (phase, reset_in) = match state.phase {
            Phase::Closed => (CircuitPhase::Closed, None),
            Phase::Open { until } if now < until => (CircuitPhase::Open, Some(until - now)),
            Phase::Open { .. } | Phase::HalfOpen { .. } => (CircuitPhase::HalfOpen, None),
        };
        CircuitSnapshot {
            phase,
            consecutive_failures: state.consecutive_failures,
            cooldown: state.cooldown,
            reset_in,
        }
    }

    /// Forget all state for `source`, closing its circuit.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn reset(&self, source: SourceKey) {
        self.states.lock().expect("mutex poisoned").remove(&source);
    }
}
