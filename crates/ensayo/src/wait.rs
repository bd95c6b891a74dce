//! Bounded polling primitives.
//!
//! Every wait in the crate goes through here: an explicit timeout budget, a
//! fixed polling interval, never an unbounded spin. Fixed-delay pauses exist
//! only as a local debugging aid and are a no-op under CI.

use crate::config::RunMode;
use crate::driver::PageDriver;
use crate::locator::InteractionTarget;
use crate::result::{EnsayoError, EnsayoResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// ELEMENT STATE
// =============================================================================

/// Readiness states a wait can require of a target.
///
/// `Visible` implies `Attached`; `Enabled` is only meaningful where the
/// application signals it semantically (buttons, inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Exists in the tree; visibility not required
    Attached,
    /// Rendered and visible
    Visible,
    /// Visible and accepting input
    Enabled,
}

impl ElementState {
    /// State name used in failure messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Enabled => "enabled",
        }
    }
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAIT OPERATIONS
// =============================================================================

/// Block the calling flow until `target` satisfies `state` or the timeout
/// elapses.
///
/// # Errors
///
/// [`EnsayoError::ConditionNotMet`] when the target existed at some point
/// but never reached `state`; [`EnsayoError::StructuralNotFound`] when the
/// selector matched nothing across the whole window — the latter signals
/// contract drift and is not worth retrying.
pub async fn await_state(
    driver: &dyn PageDriver,
    target: &InteractionTarget,
    state: ElementState,
    options: &WaitOptions,
) -> EnsayoResult<WaitResult> {
    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();
    let mut ever_attached = false;

    loop {
        let probe = driver.probe(target).await?;
        ever_attached |= probe.attached;

        if probe.satisfies(state) {
            debug!(
                target = %target.description(),
                state = %state,
                elapsed = ?start.elapsed(),
                "state reached"
            );
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                waited_for: format!("{} {}", target.description(), state),
            });
        }

        if start.elapsed() + poll_interval >= timeout {
            break;
        }
        sleep(poll_interval).await;
    }

    if ever_attached {
        Err(EnsayoError::ConditionNotMet {
            target: target.description(),
            state: state.as_str().to_string(),
            ms: options.timeout_ms,
        })
    } else {
        Err(EnsayoError::StructuralNotFound {
            target: target.description(),
        })
    }
}

/// Poll an arbitrary async predicate until it returns true.
///
/// # Errors
///
/// [`EnsayoError::ConditionNotMet`] if the predicate never turned true
/// within the budget.
pub async fn wait_until<F, Fut>(
    mut predicate: F,
    description: &str,
    options: &WaitOptions,
) -> EnsayoResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();

    loop {
        if predicate().await {
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                waited_for: description.to_string(),
            });
        }
        if start.elapsed() + poll_interval >= timeout {
            break;
        }
        sleep(poll_interval).await;
    }

    Err(EnsayoError::ConditionNotMet {
        target: description.to_string(),
        state: "satisfied".to_string(),
        ms: options.timeout_ms,
    })
}

/// Fixed pause for local debugging only. Under CI this is a strict no-op —
/// a fixed delay is never a synchronization primitive.
pub async fn debug_pause(mode: RunMode, ms: u64) {
    if mode.is_ci() {
        return;
    }
    debug!(ms, "debug pause (local run only)");
    sleep(Duration::from_millis(ms)).await;
}
