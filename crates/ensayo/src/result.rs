//! Result and error types for Ensayo.

use thiserror::Error;

/// Result type for Ensayo operations
pub type EnsayoResult<T> = Result<T, EnsayoError>;

/// Errors that can occur in Ensayo
#[derive(Debug, Error)]
pub enum EnsayoError {
    /// A dependent stage asked for an artifact no earlier stage produced.
    ///
    /// Raised for a missing backing file, an absent key, and an unreadable
    /// record alike: in every case the dependent stage cannot meaningfully
    /// proceed.
    #[error("missing artifact `{key}`: {reason}")]
    MissingArtifact {
        /// Artifact key that was requested
        key: String,
        /// Why the artifact could not be produced
        reason: String,
    },

    /// A target did not reach the required state within its timeout.
    ///
    /// This is the retryable/timing kind: capability probes absorb it,
    /// mandatory interactions surface it.
    #[error("condition not met: {target} did not become {state} within {ms}ms")]
    ConditionNotMet {
        /// Description of the target that was waited on
        target: String,
        /// The state that was never reached
        state: String,
        /// Timeout budget that elapsed
        ms: u64,
    },

    /// The selector never matched anything in the tree.
    ///
    /// Unlike [`EnsayoError::ConditionNotMet`] this signals real contract
    /// drift and is never worth retrying blindly.
    #[error("no element ever matched {target}")]
    StructuralNotFound {
        /// Description of the target that never resolved
        target: String,
    },

    /// An input rejected programmatic assignment: the committed value does
    /// not equal what was typed.
    #[error("value mismatch on {target}: typed `{expected}`, committed `{actual}`")]
    ValueMismatch {
        /// Description of the input
        target: String,
        /// Value that was requested
        expected: String,
        /// Value the page actually committed
        actual: String,
    },

    /// A click failed even after the single forced retry.
    #[error("click on {target} failed after forced retry: {reason}")]
    ClickFailed {
        /// Description of the click target
        target: String,
        /// Failure reported by the driver
        reason: String,
    },

    /// Stage plan validation error (duplicate name, unknown dependency,
    /// dependency cycle).
    #[error("invalid stage plan: {message}")]
    InvalidPlan {
        /// What the validation pass rejected
        message: String,
    },

    /// Environment configuration error (missing or malformed variable).
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Driver-level page error (lost connection, evaluation failure,
    /// navigation failure).
    #[error("page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Browser could not be launched or connected to.
    #[error("failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnsayoError {
    /// Whether a capability probe may absorb this error as "unavailable".
    ///
    /// Probing flows treat a target that never turned up — by timeout or by
    /// never matching — as expected data, not a failure. Everything else
    /// (I/O, mismatch, plan errors) stays fatal even inside a probe.
    #[must_use]
    pub const fn is_probe_soft(&self) -> bool {
        matches!(
            self,
            Self::ConditionNotMet { .. } | Self::StructuralNotFound { .. }
        )
    }
}
