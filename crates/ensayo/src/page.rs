//! Page contracts and the shared base page.
//!
//! A page object encapsulates one logical screen; all of them act through
//! [`BasePage`], which owns the driver and the resilient interaction layer.
//! [`PageContract`] is the one current, versioned description of a screen —
//! a URL pattern and a readiness marker — with selector details left to the
//! page-object layer that owns them.

use crate::driver::PageDriver;
use crate::interaction::{ClickOutcome, Interactor};
use crate::locator::{InteractionTarget, Selector};
use crate::result::EnsayoResult;
use crate::wait::{wait_until, ElementState, WaitOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Contract for one logical screen.
pub trait PageContract {
    /// Substring the page URL must contain once the screen is active.
    fn url_pattern(&self) -> &str;

    /// The element whose visibility marks the screen as ready for
    /// interaction.
    fn ready_marker(&self) -> InteractionTarget;

    /// Budget for reaching readiness, in milliseconds.
    fn ready_timeout_ms(&self) -> u64 {
        15_000
    }

    /// Page name for logging/debugging.
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared behavior for all page objects: navigation, resilient clicking and
/// filling, and artifact re-validation.
#[derive(Debug, Clone)]
pub struct BasePage {
    interactor: Interactor,
}

impl BasePage {
    /// Create a base page over a driver with default interaction options.
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self {
            interactor: Interactor::new(driver),
        }
    }

    /// Create a base page over a pre-configured interactor.
    #[must_use]
    pub const fn with_interactor(interactor: Interactor) -> Self {
        Self { interactor }
    }

    /// The interaction layer.
    #[must_use]
    pub const fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// The underlying driver.
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        self.interactor.driver()
    }

    /// Navigate to a URL.
    pub async fn goto(&self, url: &str) -> EnsayoResult<()> {
        info!(url, "navigating");
        self.driver().goto(url).await
    }

    /// Wait until the screen described by `contract` is active: URL matches
    /// and the readiness marker is visible.
    pub async fn wait_until_ready<P: PageContract>(&self, contract: &P) -> EnsayoResult<()> {
        let pattern = contract.url_pattern();
        let opts = WaitOptions::new().with_timeout(contract.ready_timeout_ms());

        let driver = self.driver().clone();
        wait_until(
            || {
                let driver = driver.clone();
                async move {
                    (driver.current_url().await)
                        .map(|url| url.contains(pattern))
                        .unwrap_or(false)
                }
            },
            &format!("URL contains `{pattern}`"),
            &opts,
        )
        .await?;

        let marker = contract
            .ready_marker()
            .with_timeout(Duration::from_millis(contract.ready_timeout_ms()));
        self.interactor.expect_visible(&marker).await?;

        info!(page = contract.page_name(), "page ready");
        Ok(())
    }

    /// Standard click: wait until visible, then click.
    pub async fn click(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.interactor
            .await_state(target, ElementState::Visible)
            .await?;
        self.driver().click(target, false).await
    }

    /// Click with overlay/animation recovery (one forced retry).
    pub async fn robust_click(&self, target: &InteractionTarget) -> EnsayoResult<ClickOutcome> {
        self.interactor.click_robust(target).await
    }

    /// Click a button and wait for a success signal, race-free.
    pub async fn click_and_wait_for_success(
        &self,
        button: &InteractionTarget,
        success: &InteractionTarget,
        timeout: Duration,
    ) -> EnsayoResult<()> {
        self.interactor
            .click_and_await_signal(button, success, timeout)
            .await?;
        Ok(())
    }

    /// Wait until the element exists in the DOM; visibility not required.
    pub async fn wait_for_attached(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.interactor.wait_for_attached(target).await
    }

    /// Fill an input and verify the committed value.
    pub async fn stable_fill(&self, target: &InteractionTarget, value: &str) -> EnsayoResult<()> {
        self.interactor.fill_stable(target, value).await
    }

    /// Assert the element is visible.
    pub async fn expect_visible(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.interactor.expect_visible(target).await
    }

    /// Re-validate a retrieved artifact: the entity with the given name
    /// must actually be rendered inside `container` before a stage acts on
    /// it. CSS containers are narrowed by the name text; other strategies
    /// should be passed already narrowed.
    ///
    /// # Errors
    ///
    /// The usual wait errors; a missing entity surfaces as
    /// [`EnsayoError::StructuralNotFound`], which dependent stages treat
    /// as a precondition failure, not an assertion failure.
    pub async fn verify_entity_present(
        &self,
        container: &Selector,
        name: &str,
    ) -> EnsayoResult<()> {
        let target = InteractionTarget::new(container.clone().with_text(name))
            .described(format!("entity \"{name}\""));
        self.interactor.expect_visible(&target).await
    }
}
