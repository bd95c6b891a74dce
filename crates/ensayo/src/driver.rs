//! The page seam: everything the interaction layer needs from a live page.
//!
//! The trait keeps the resilient layer independent of any one automation
//! backend: the crate ships [`MockPage`](crate::mock::MockPage) for tests,
//! and a CDP-backed adapter behind the `browser` feature.

use crate::locator::{InteractionTarget, Selector};
use crate::result::EnsayoResult;
use crate::wait::ElementState;
use async_trait::async_trait;
use std::path::Path;

/// Snapshot of an element's readiness at one poll instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementProbe {
    /// Element exists in the tree
    pub attached: bool,
    /// Element is rendered and visible
    pub visible: bool,
    /// Element accepts input
    pub enabled: bool,
}

impl ElementProbe {
    /// Probe result for an element that is not in the tree at all.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            attached: false,
            visible: false,
            enabled: false,
        }
    }

    /// Whether this snapshot satisfies the given state requirement.
    #[must_use]
    pub const fn satisfies(&self, state: ElementState) -> bool {
        match state {
            ElementState::Attached => self.attached,
            ElementState::Visible => self.visible,
            ElementState::Enabled => self.enabled,
        }
    }
}

/// Async driver for one browser page.
///
/// Every method is a potential suspension point (a round-trip to the
/// browser); implementations must not block the executor. Single-shot
/// operations report their own failures; the bounded retrying lives one
/// layer up in [`Interactor`](crate::interaction::Interactor).
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url` and wait for the DOM to be ready.
    async fn goto(&self, url: &str) -> EnsayoResult<()>;

    /// The page's current URL.
    async fn current_url(&self) -> EnsayoResult<String>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &Selector) -> EnsayoResult<usize>;

    /// Probe the target's current readiness. A target that resolves to
    /// nothing yields [`ElementProbe::detached`], not an error.
    async fn probe(&self, target: &InteractionTarget) -> EnsayoResult<ElementProbe>;

    /// Single click attempt. `force` bypasses hit-testing (overlays,
    /// mid-transition elements); a failed attempt is an error the caller
    /// may retry.
    async fn click(&self, target: &InteractionTarget, force: bool) -> EnsayoResult<()>;

    /// Scroll the target into the viewport if needed.
    async fn scroll_into_view(&self, target: &InteractionTarget) -> EnsayoResult<()>;

    /// Clear an input through the keyboard (select-all then delete), so
    /// framework-managed inputs that ignore programmatic value assignment
    /// are still emptied.
    async fn clear_input(&self, target: &InteractionTarget) -> EnsayoResult<()>;

    /// Type `text` into the focused target.
    async fn type_text(&self, target: &InteractionTarget, text: &str) -> EnsayoResult<()>;

    /// The value the page actually committed for an input.
    async fn committed_value(&self, target: &InteractionTarget) -> EnsayoResult<String>;

    /// The target's rendered inner text.
    async fn inner_text(&self, target: &InteractionTarget) -> EnsayoResult<String>;

    /// Capture a screenshot of the page to `path`.
    async fn screenshot(&self, path: &Path) -> EnsayoResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_probe_satisfies_nothing() {
        let probe = ElementProbe::detached();
        assert!(!probe.satisfies(ElementState::Attached));
        assert!(!probe.satisfies(ElementState::Visible));
        assert!(!probe.satisfies(ElementState::Enabled));
    }

    #[test]
    fn test_attached_but_hidden() {
        let probe = ElementProbe {
            attached: true,
            visible: false,
            enabled: false,
        };
        assert!(probe.satisfies(ElementState::Attached));
        assert!(!probe.satisfies(ElementState::Visible));
    }

    #[test]
    fn test_fully_ready_probe() {
        let probe = ElementProbe {
            attached: true,
            visible: true,
            enabled: true,
        };
        assert!(probe.satisfies(ElementState::Attached));
        assert!(probe.satisfies(ElementState::Visible));
        assert!(probe.satisfies(ElementState::Enabled));
    }
}
