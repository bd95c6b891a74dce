//! Ensayo: stage-ordered browser test coordination.
//!
//! A pipeline of independently-launched test stages (create a group,
//! activate it, configure membership, schedule a session) needs two things
//! the test runner itself does not provide: a way to hand artifacts from
//! one stage's process to the next, and UI interactions that survive an
//! asynchronously-rendering page without masking real failures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       ENSAYO Architecture                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   depends on   ┌───────────┐   artifacts   ┌────┐ │
//! │  │ stage N   │───────────────►│ stage N+1 │◄─────────────►│JSON│ │
//! │  │ (process) │  (StagePlan)   │ (process) │ (ArtifactStore)└────┘│
//! │  └─────┬─────┘                └─────┬─────┘                      │
//! │        │      page objects          │                            │
//! │        ▼                            ▼                            │
//! │  ┌──────────────────────────────────────────┐                    │
//! │  │ Interactor / CandidateScanner / waits    │                    │
//! │  └─────────────────────┬────────────────────┘                    │
//! │                        ▼                                         │
//! │           PageDriver (mock, or CDP with `browser`)               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stages run strictly sequentially under the runner's dependency graph;
//! the store assumes that ordering and the plan declares it. Parallelism
//! exists only across independent stages, each with its own browser
//! context — the JSON record on disk is the only shared mutable state.

#![warn(missing_docs)]

pub mod config;
pub mod data;
pub mod diag;
pub mod driver;
pub mod interaction;
pub mod locator;
pub mod logging;
pub mod mock;
pub mod page;
pub mod result;
pub mod scan;
pub mod stage;
pub mod store;
pub mod wait;

#[cfg(feature = "browser")]
pub mod browser;

pub use result::{EnsayoError, EnsayoResult};

/// Common imports for suite code.
pub mod prelude {
    pub use crate::config::{EnvConfig, RunMode, UserRole};
    pub use crate::data;
    pub use crate::diag::ScreenshotSink;
    pub use crate::driver::{ElementProbe, PageDriver};
    pub use crate::interaction::{ClickOutcome, ClickPhase, Interactor};
    pub use crate::locator::{InteractionTarget, Selector};
    pub use crate::page::{BasePage, PageContract};
    pub use crate::result::{EnsayoError, EnsayoResult};
    pub use crate::scan::{CandidateJudge, CandidateScanner, ScanOutcome};
    pub use crate::stage::{StageOutcome, StagePlan, StageSpec};
    pub use crate::store::{ArtifactStore, FileStore, MemoryStore};
    pub use crate::wait::{debug_pause, ElementState, WaitOptions};

    #[cfg(feature = "browser")]
    pub use crate::browser::{Browser, BrowserConfig};
}
