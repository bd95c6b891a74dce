//! Selectors and interaction targets.
//!
//! A [`Selector`] is the resolution strategy for finding an element; an
//! [`InteractionTarget`] binds a selector to the context an action needs —
//! a human-readable description for failure messages, a timeout budget, and
//! optionally an index into a multi-match selector.
//!
//! Each logical screen owns one current selector contract per target;
//! historical selector variants are deliberately not encoded here.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-action timeout budget (10 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 10_000;

/// Selector strategy for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `button.primary`)
    Css(String),
    /// Match by text content
    Text(String),
    /// Test ID selector (`data-testid` attribute)
    TestId(String),
    /// ARIA role with accessible name (e.g., role `link`, name `My Groups`)
    Role {
        /// ARIA role
        role: String,
        /// Accessible name
        name: String,
    },
    /// CSS selector narrowed by contained text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text-content selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a role selector with an accessible name
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// Narrow a CSS selector by contained text.
    ///
    /// Non-CSS strategies already carry their own text and are returned
    /// unchanged.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::Role { role, name } => write!(f, "role={role}[name={name}]"),
            Self::CssWithText { css, text } => write!(f, "css={css}[text={text}]"),
        }
    }
}

/// A UI element bound for an action.
///
/// Actions never run against an unresolved target: the interaction layer
/// first establishes the minimum state the action requires (fill needs
/// visible, click needs attached) within this target's timeout budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionTarget {
    selector: Selector,
    nth: Option<usize>,
    description: Option<String>,
    timeout: Duration,
}

impl InteractionTarget {
    /// Create a target with the default timeout budget.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            nth: None,
            description: None,
            timeout: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
        }
    }

    /// Attach a human-readable description used in failure messages.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bind to the n-th (0-based) match of the selector.
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    /// Override the timeout budget for actions against this target.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The selector strategy.
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Index into a multi-match selector, if bound.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.nth
    }

    /// The timeout budget for actions against this target.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Description for failure messages; falls back to the selector.
    #[must_use]
    pub fn description(&self) -> String {
        match (&self.description, self.nth) {
            (Some(d), _) => d.clone(),
            (None, Some(i)) => format!("{} #{i}", self.selector),
            (None, None) => self.selector.to_string(),
        }
    }
}

impl From<Selector> for InteractionTarget {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}
