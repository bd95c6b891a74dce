//! Scripted page driver for testing without a browser.
//!
//! [`MockPage`] models just enough of a dynamically-rendering page to
//! exercise the resilient interaction layer: elements that appear late or
//! vanish, overlays that intercept clicks, inputs that silently drop
//! keystrokes, and click-triggered reveals (menus, toasts).
//!
//! Time is driven by the tokio clock, so tests running under
//! `#[tokio::test(start_paused = true)]` get deterministic timing.

use crate::driver::{ElementProbe, PageDriver};
use crate::locator::{InteractionTarget, Selector};
use crate::result::{EnsayoError, EnsayoResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted element.
#[derive(Debug, Clone)]
pub struct MockElement {
    text: String,
    value: String,
    visible: bool,
    enabled: bool,
    appears_at: Option<Instant>,
    visible_from: Option<Instant>,
    hides_at: Option<Instant>,
    blocked_clicks: u32,
    force_fails: bool,
    drop_char_at: Option<usize>,
}

impl MockElement {
    /// An attached, visible, enabled element with the given rendered text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: String::new(),
            visible: true,
            enabled: true,
            appears_at: None,
            visible_from: None,
            hides_at: None,
            blocked_clicks: 0,
            force_fails: false,
            drop_char_at: None,
        }
    }

    /// Attached but not visible.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Visible but not accepting input.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Not in the tree until `delay` from now.
    #[must_use]
    pub fn appearing_in(mut self, delay: Duration) -> Self {
        self.appears_at = Some(Instant::now() + delay);
        self
    }

    /// Attached from the start, but hidden (mid-animation) until `delay`
    /// from now.
    #[must_use]
    pub fn revealing_in(mut self, delay: Duration) -> Self {
        self.visible_from = Some(Instant::now() + delay);
        self
    }

    /// Removed from the tree `window` after it appears.
    #[must_use]
    pub fn vanishing_after(mut self, window: Duration) -> Self {
        let from = self.appears_at.unwrap_or_else(Instant::now);
        self.hides_at = Some(from + window);
        self
    }

    /// The first `n` normal clicks fail (an overlay intercepts them);
    /// forced clicks bypass the overlay.
    #[must_use]
    pub const fn blocking_clicks(mut self, n: u32) -> Self {
        self.blocked_clicks = n;
        self
    }

    /// Even forced clicks fail on this element.
    #[must_use]
    pub const fn rejecting_forced_clicks(mut self) -> Self {
        self.force_fails = true;
        self
    }

    /// Silently drop the character at `index` when text is typed in —
    /// models inputs that lose keystrokes mid-animation.
    #[must_use]
    pub const fn dropping_char_at(mut self, index: usize) -> Self {
        self.drop_char_at = Some(index);
        self
    }

    fn present(&self, now: Instant) -> bool {
        if let Some(t) = self.appears_at {
            if now < t {
                return false;
            }
        }
        if let Some(t) = self.hides_at {
            if now >= t {
                return false;
            }
        }
        true
    }
}

/// A click-triggered reveal: clicking the trigger schedules the target
/// elements to appear (and optionally vanish again).
#[derive(Debug, Clone)]
struct Reveal {
    target_key: String,
    delay: Duration,
    visible_for: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    dom: BTreeMap<String, Vec<MockElement>>,
    reveals: HashMap<String, Vec<Reveal>>,
    clicks: Vec<(String, bool)>,
    click_attempts: Vec<(String, bool)>,
    screenshots: Vec<PathBuf>,
}

/// Scripted page driver.
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    /// An empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock page state poisoned")
    }

    /// Add an element under the selector.
    pub fn insert(&self, selector: &Selector, element: MockElement) {
        self.lock()
            .dom
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }

    /// Add several elements under the same selector, in encounter order.
    pub fn insert_many(&self, selector: &Selector, elements: Vec<MockElement>) {
        self.lock()
            .dom
            .entry(selector.to_string())
            .or_default()
            .extend(elements);
    }

    /// Script: clicking `trigger` makes `signal` appear after `delay`,
    /// vanishing again after `visible_for` if given.
    pub fn on_click_reveal(
        &self,
        trigger: &Selector,
        signal: &Selector,
        delay: Duration,
        visible_for: Option<Duration>,
    ) {
        self.lock()
            .reveals
            .entry(trigger.to_string())
            .or_default()
            .push(Reveal {
                target_key: signal.to_string(),
                delay,
                visible_for,
            });
    }

    /// Remove all elements under the selector from the tree.
    pub fn detach_all(&self, selector: &Selector) {
        self.lock().dom.remove(&selector.to_string());
    }

    /// Successful clicks recorded so far as (selector, forced) pairs.
    #[must_use]
    pub fn clicks(&self) -> Vec<(String, bool)> {
        self.lock().clicks.clone()
    }

    /// Every click attempt, successful or not, as (selector, forced) pairs.
    #[must_use]
    pub fn click_attempts(&self) -> Vec<(String, bool)> {
        self.lock().click_attempts.clone()
    }

    /// Whether any click (normal or forced) was recorded for the selector.
    #[must_use]
    pub fn was_clicked(&self, selector: &Selector) -> bool {
        let key = selector.to_string();
        self.lock().clicks.iter().any(|(desc, _)| desc == &key)
    }

    /// Screenshot paths recorded so far.
    #[must_use]
    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock().screenshots.clone()
    }

    /// Index (into the full element list) of the n-th *present* element.
    fn resolve_index(
        state: &MockState,
        target: &InteractionTarget,
        now: Instant,
    ) -> Option<(String, usize)> {
        let key = target.selector().to_string();
        let elements = state.dom.get(&key)?;
        let wanted = target.index().unwrap_or(0);
        let mut seen = 0usize;
        for (i, el) in elements.iter().enumerate() {
            if el.present(now) {
                if seen == wanted {
                    return Some((key, i));
                }
                seen += 1;
            }
        }
        None
    }

    fn with_element<T>(
        &self,
        target: &InteractionTarget,
        op: impl FnOnce(&mut MockState, String, usize) -> EnsayoResult<T>,
    ) -> EnsayoResult<T> {
        let now = Instant::now();
        let mut state = self.lock();
        match Self::resolve_index(&state, target, now) {
            Some((key, idx)) => op(&mut state, key, idx),
            None => Err(EnsayoError::PageError {
                message: format!("{} is not attached", target.description()),
            }),
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> EnsayoResult<()> {
        self.lock().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> EnsayoResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn count(&self, selector: &Selector) -> EnsayoResult<usize> {
        let now = Instant::now();
        let state = self.lock();
        Ok(state
            .dom
            .get(&selector.to_string())
            .map_or(0, |els| els.iter().filter(|el| el.present(now)).count()))
    }

    async fn probe(&self, target: &InteractionTarget) -> EnsayoResult<ElementProbe> {
        let now = Instant::now();
        let state = self.lock();
        Ok(match Self::resolve_index(&state, target, now) {
            Some((key, idx)) => {
                let el = &state.dom[&key][idx];
                let visible = el.visible && el.visible_from.map_or(true, |t| now >= t);
                ElementProbe {
                    attached: true,
                    visible,
                    enabled: visible && el.enabled,
                }
            }
            None => ElementProbe::detached(),
        })
    }

    async fn click(&self, target: &InteractionTarget, force: bool) -> EnsayoResult<()> {
        let now = Instant::now();
        self.with_element(target, |state, key, idx| {
            state.click_attempts.push((key.clone(), force));
            {
                let el = &mut state.dom.get_mut(&key).expect("resolved key")[idx];
                if force && el.force_fails {
                    return Err(EnsayoError::PageError {
                        message: format!("forced click on {key} failed"),
                    });
                }
                if !force && el.blocked_clicks > 0 {
                    el.blocked_clicks -= 1;
                    return Err(EnsayoError::PageError {
                        message: format!("click on {key} intercepted by overlay"),
                    });
                }
            }

            state.clicks.push((key.clone(), force));

            // apply scripted reveals for this trigger
            let reveals = state.reveals.get(&key).cloned().unwrap_or_default();
            for reveal in reveals {
                if let Some(els) = state.dom.get_mut(&reveal.target_key) {
                    for el in els {
                        el.appears_at = Some(now + reveal.delay);
                        el.hides_at = reveal.visible_for.map(|w| now + reveal.delay + w);
                    }
                }
            }
            Ok(())
        })
    }

    async fn scroll_into_view(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.with_element(target, |_, _, _| Ok(()))
    }

    async fn clear_input(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        self.with_element(target, |state, key, idx| {
            state.dom.get_mut(&key).expect("resolved key")[idx]
                .value
                .clear();
            Ok(())
        })
    }

    async fn type_text(&self, target: &InteractionTarget, text: &str) -> EnsayoResult<()> {
        self.with_element(target, |state, key, idx| {
            let el = &mut state.dom.get_mut(&key).expect("resolved key")[idx];
            for (i, ch) in text.chars().enumerate() {
                if el.drop_char_at == Some(i) {
                    continue;
                }
                el.value.push(ch);
            }
            Ok(())
        })
    }

    async fn committed_value(&self, target: &InteractionTarget) -> EnsayoResult<String> {
        self.with_element(target, |state, key, idx| Ok(state.dom[&key][idx].value.clone()))
    }

    async fn inner_text(&self, target: &InteractionTarget) -> EnsayoResult<String> {
        self.with_element(target, |state, key, idx| Ok(state.dom[&key][idx].text.clone()))
    }

    async fn screenshot(&self, path: &Path) -> EnsayoResult<()> {
        std::fs::write(path, b"mock screenshot")?;
        self.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(selector: &Selector) -> InteractionTarget {
        InteractionTarget::new(selector.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_ignores_not_yet_attached() {
        let page = MockPage::new();
        let cards = Selector::test_id("group-card");
        page.insert(&cards, MockElement::new("Group A 5 Members"));
        page.insert(
            &cards,
            MockElement::new("Group B 3 Members").appearing_in(Duration::from_secs(1)),
        );

        assert_eq!(page.count(&cards).await.unwrap(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(page.count(&cards).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nth_indexes_present_elements() {
        let page = MockPage::new();
        let cards = Selector::test_id("group-card");
        page.insert_many(
            &cards,
            vec![
                MockElement::new("Group A").appearing_in(Duration::from_secs(5)),
                MockElement::new("Group B"),
            ],
        );

        // Group A is not attached yet, so index 0 resolves to Group B
        let text = page.inner_text(&target(&cards)).await.unwrap();
        assert_eq!(text, "Group B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_click_then_success() {
        let page = MockPage::new();
        let button = Selector::css("button.submit");
        page.insert(&button, MockElement::new("Submit").blocking_clicks(1));

        assert!(page.click(&target(&button), false).await.is_err());
        assert!(page.click(&target(&button), false).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_click_bypasses_overlay() {
        let page = MockPage::new();
        let button = Selector::css("button.submit");
        page.insert(&button, MockElement::new("Submit").blocking_clicks(99));

        assert!(page.click(&target(&button), true).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_reveal_schedules_appearance() {
        let page = MockPage::new();
        let trigger = Selector::role("button", "Save");
        let toast = Selector::text("Saved!");
        page.insert(&trigger, MockElement::new("Save"));
        page.insert(
            &toast,
            MockElement::new("Saved!").appearing_in(Duration::from_secs(3600)),
        );
        page.on_click_reveal(
            &trigger,
            &toast,
            Duration::from_millis(100),
            Some(Duration::from_millis(200)),
        );

        page.click(&target(&trigger), false).await.unwrap();
        assert_eq!(page.count(&toast).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(page.count(&toast).await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(page.count(&toast).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_all_models_a_rerender() {
        let page = MockPage::new();
        let cards = Selector::test_id("group-card");
        page.insert(&cards, MockElement::new("Group A"));
        assert_eq!(page.count(&cards).await.unwrap(), 1);

        page.detach_all(&cards);
        assert_eq!(page.count(&cards).await.unwrap(), 0);
        let probe = page.probe(&target(&cards)).await.unwrap();
        assert!(!probe.attached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_with_dropped_char() {
        let page = MockPage::new();
        let input = Selector::css("input[name='groupName']");
        page.insert(&input, MockElement::new("").dropping_char_at(1));

        page.type_text(&target(&input), "abc").await.unwrap();
        assert_eq!(page.committed_value(&target(&input)).await.unwrap(), "ac");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_then_type() {
        let page = MockPage::new();
        let input = Selector::css("input");
        page.insert(&input, MockElement::new(""));

        page.type_text(&target(&input), "old").await.unwrap();
        page.clear_input(&target(&input)).await.unwrap();
        page.type_text(&target(&input), "new").await.unwrap();
        assert_eq!(page.committed_value(&target(&input)).await.unwrap(), "new");
    }
}
