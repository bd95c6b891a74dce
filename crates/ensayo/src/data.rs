//! Unique test data.
//!
//! Stages never hard-code entity names: a created group must be findable by
//! the exact name a later stage retrieves from the store, so names carry a
//! millisecond timestamp, and ids add a short random suffix.

use chrono::{Days, Utc};
use uuid::Uuid;

fn millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Group name unique to this run, e.g. `Test Group 1736424000000`.
#[must_use]
pub fn group_name() -> String {
    format!("Test Group {}", millis())
}

/// Session title unique to this run.
#[must_use]
pub fn session_title() -> String {
    format!("Session {}", millis())
}

/// Short unique title with a prefix.
#[must_use]
pub fn title(prefix: &str) -> String {
    format!("{prefix} {}", short_suffix())
}

/// Longer free-text description.
#[must_use]
pub fn description(prefix: &str) -> String {
    format!("{prefix} {}", short_suffix())
}

/// Throwaway email address on the given domain.
#[must_use]
pub fn email(domain: &str) -> String {
    format!("user_{}@{domain}", short_suffix())
}

/// Identifier carrying both a timestamp and a random suffix.
#[must_use]
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}_{}_{}", millis(), short_suffix())
}

/// Today's date as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// A date `days` ahead as `YYYY-MM-DD`.
#[must_use]
pub fn future_date(days: u64) -> String {
    Utc::now()
        .checked_add_days(Days::new(days))
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string()
}

/// Pick one option, varying run to run.
fn pick<'a>(options: &[&'a str]) -> &'a str {
    assert!(!options.is_empty(), "pick needs at least one option");
    let idx = Utc::now().timestamp_subsec_nanos() as usize % options.len();
    options[idx]
}

/// A session start time slot.
#[must_use]
pub fn start_time() -> &'static str {
    pick(&["10:00 AM", "11:00 AM", "12:00 PM"])
}

/// A session end time slot.
#[must_use]
pub fn end_time() -> &'static str {
    pick(&["10:30 AM", "11:30 AM", "12:30 PM"])
}

/// A session timezone.
#[must_use]
pub fn timezone() -> &'static str {
    pick(&["Asia/Bangkok", "Asia/Kolkata", "Europe/London"])
}
