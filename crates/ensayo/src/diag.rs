//! Failure diagnostics side channel.
//!
//! On unrecoverable interaction failure a screenshot lands in a
//! conventional directory for post-mortem inspection. Capture is strictly
//! best-effort: stage results never depend on it, and a capture failure is
//! logged, not propagated.

use crate::driver::PageDriver;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Conventional screenshot directory, relative to the run's working
/// directory.
pub const DEFAULT_SCREENSHOT_DIR: &str = "artifacts/screenshots";

/// Writes stage-qualified, timestamped screenshots.
#[derive(Debug, Clone)]
pub struct ScreenshotSink {
    dir: PathBuf,
}

impl Default for ScreenshotSink {
    fn default() -> Self {
        Self::new(DEFAULT_SCREENSHOT_DIR)
    }
}

impl ScreenshotSink {
    /// Sink writing into `dir` (created on first capture).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture the page for post-mortem inspection.
    ///
    /// Returns the written path, or `None` if anything failed — never an
    /// error.
    pub async fn capture(&self, driver: &dyn PageDriver, label: &str) -> Option<PathBuf> {
        let safe_label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let path = self.dir.join(format!("{safe_label}-{stamp}.png"));

        if let Err(err) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), %err, "could not create screenshot dir");
            return None;
        }

        match driver.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(path = %path.display(), %err, "screenshot capture failed");
                None
            }
        }
    }
}
