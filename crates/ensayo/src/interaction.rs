//! Resilient UI actions.
//!
//! Every action here performs a UI operation against a live,
//! asynchronously-rendering page such that transient states — element not
//! yet attached, covered by an overlay, mid-animation, value not yet
//! committed — do not cause false failures, while genuine failures still
//! surface promptly:
//!
//! - [`Interactor::fill_stable`] clears through the keyboard, types, then
//!   reads the committed value back and fails loudly on a mismatch.
//! - [`Interactor::click_robust`] is a two-phase state machine: one normal
//!   attempt, one forced retry after a short grace, then failure.
//! - [`Interactor::click_and_await_signal`] starts watching for the success
//!   signal *concurrently* with the click, so a signal that appears and
//!   vanishes quickly is never missed.
//! - [`Interactor::probe_visible`] converts "never turned up" into `false`
//!   for capability probing, where unavailability is data, not an error.

use crate::driver::PageDriver;
use crate::locator::InteractionTarget;
use crate::result::{EnsayoError, EnsayoResult};
use crate::wait::{await_state, ElementState, WaitOptions, WaitResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Grace period before the single forced-click retry (milliseconds).
///
/// Long enough for an overlay dismissal or transition to finish; this is
/// part of the click contract, not a synchronization primitive.
pub const CLICK_RETRY_GRACE_MS: u64 = 300;

/// Which phase of the click state machine succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPhase {
    /// The normal, hit-tested click
    Attempted,
    /// The forced click issued after the normal one failed
    ForcedRetry,
}

/// Outcome of a successful [`Interactor::click_robust`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The phase that landed the click
    pub phase: ClickPhase,
}

/// Performs resilient actions against one page through a [`PageDriver`].
#[derive(Clone)]
pub struct Interactor {
    driver: Arc<dyn PageDriver>,
    options: WaitOptions,
}

impl std::fmt::Debug for Interactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interactor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Interactor {
    /// Create an interactor with default wait options.
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self {
            driver,
            options: WaitOptions::default(),
        }
    }

    /// Override the default wait options (poll interval, fallback timeout).
    #[must_use]
    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying driver.
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Wait options bounded by the target's own timeout budget.
    fn budget(&self, target: &InteractionTarget) -> WaitOptions {
        let ms = u64::try_from(target.timeout().as_millis()).unwrap_or(u64::MAX);
        self.options.clone().with_timeout(ms)
    }

    /// Block until `target` satisfies `state`, within the target's budget.
    pub async fn await_state(
        &self,
        target: &InteractionTarget,
        state: ElementState,
    ) -> EnsayoResult<WaitResult> {
        await_state(self.driver.as_ref(), target, state, &self.budget(target)).await
    }

    /// Wait until the target exists in the tree; visibility not required.
    pub async fn wait_for_attached(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.await_state(target, ElementState::Attached).await?;
        Ok(())
    }

    /// Wait until the target is visible.
    pub async fn expect_visible(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.await_state(target, ElementState::Visible).await?;
        Ok(())
    }

    /// Fill an input and verify the page committed exactly that value.
    ///
    /// The field is cleared through an explicit select-all + delete rather
    /// than a blind overwrite, so framework-managed inputs that ignore
    /// programmatic value assignment are still correctly emptied. After
    /// typing, the committed value is read back; a mismatch is a
    /// [`EnsayoError::ValueMismatch`] — a silent data-corruption bug
    /// converted into an immediate, diagnosable failure.
    pub async fn fill_stable(&self, target: &InteractionTarget, value: &str) -> EnsayoResult<()> {
        self.await_state(target, ElementState::Visible).await?;

        self.driver.clear_input(target).await?;
        self.driver.type_text(target, value).await?;

        let committed = self.driver.committed_value(target).await?;
        if committed != value {
            return Err(EnsayoError::ValueMismatch {
                target: target.description(),
                expected: value.to_string(),
                actual: committed,
            });
        }

        debug!(target = %target.description(), "fill committed and verified");
        Ok(())
    }

    /// Click with bounded recovery: wait for attachment, scroll into view,
    /// try a normal click; if it fails (typically an intercepting overlay
    /// or mid-transition state), wait a short grace period and retry once
    /// with a forced click that bypasses hit-testing. A second failure
    /// propagates — there is never a third attempt.
    pub async fn click_robust(&self, target: &InteractionTarget) -> EnsayoResult<ClickOutcome> {
        self.await_state(target, ElementState::Attached).await?;
        self.driver.scroll_into_view(target).await?;

        let mut phase = ClickPhase::Attempted;
        loop {
            let force = phase == ClickPhase::ForcedRetry;
            match self.driver.click(target, force).await {
                Ok(()) => {
                    debug!(target = %target.description(), ?phase, "click landed");
                    return Ok(ClickOutcome { phase });
                }
                Err(err) => match phase {
                    ClickPhase::Attempted => {
                        warn!(
                            target = %target.description(),
                            %err,
                            "normal click failed; retrying with forced click"
                        );
                        sleep(Duration::from_millis(CLICK_RETRY_GRACE_MS)).await;
                        phase = ClickPhase::ForcedRetry;
                    }
                    ClickPhase::ForcedRetry => {
                        return Err(EnsayoError::ClickFailed {
                            target: target.description(),
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }
    }

    /// Click `trigger` and observe `signal` (e.g. a success toast) without
    /// a race: the signal wait starts concurrently with the click, so a
    /// signal that appears and disappears between the click and a
    /// click-then-wait sequence is still caught.
    ///
    /// The trigger must be enabled before the click is issued.
    pub async fn click_and_await_signal(
        &self,
        trigger: &InteractionTarget,
        signal: &InteractionTarget,
        timeout: Duration,
    ) -> EnsayoResult<WaitResult> {
        self.await_state(trigger, ElementState::Enabled).await?;

        let signal_opts = self
            .options
            .clone()
            .with_timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));

        let signal_wait = await_state(self.driver.as_ref(), signal, ElementState::Visible, &signal_opts);
        let click = self.driver.click(trigger, false);

        let (signal_seen, clicked) = tokio::join!(signal_wait, click);
        clicked?;
        signal_seen
    }

    /// Capability probe: is the target visible within `within`?
    ///
    /// "No" — by timeout or by the selector never matching — is expected
    /// control flow here and comes back as `Ok(false)`; only real driver
    /// failures propagate.
    pub async fn probe_visible(
        &self,
        target: &InteractionTarget,
        within: Duration,
    ) -> EnsayoResult<bool> {
        let opts = self
            .options
            .clone()
            .with_timeout(u64::try_from(within.as_millis()).unwrap_or(u64::MAX));

        match await_state(self.driver.as_ref(), target, ElementState::Visible, &opts).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_probe_soft() => {
                debug!(target = %target.description(), "probe: not available");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
