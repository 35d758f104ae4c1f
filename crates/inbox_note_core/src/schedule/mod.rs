//! Job scheduler collaborator contracts.
//!
//! # Responsibility
//! - Describe the host job scheduler the plugin registers against: named
//!   recurrence intervals and hook-named recurring events.
//! - Provide the weekly interval and "Sunday this week" helpers used at load.
//!
//! # Invariants
//! - Adding an interval never removes other named intervals.
//! - An event can only reference an interval the scheduler knows.
//! - Timestamps are Unix epoch seconds, UTC.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod in_process;

pub use in_process::InProcessScheduler;

/// Seconds in one day.
pub const DAY_IN_SECONDS: u64 = 24 * 3600;
/// Period of the custom `weekly` interval.
pub const WEEK_IN_SECONDS: u64 = 7 * DAY_IN_SECONDS;
/// Name of the custom weekly interval.
pub const WEEKLY_INTERVAL: &str = "weekly";
/// Name of the host-provided daily interval.
pub const DAILY_INTERVAL: &str = "daily";

/// One named recurrence period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInterval {
    pub name: String,
    pub interval_secs: u64,
    /// Human-readable label shown by the host.
    pub display: String,
}

impl ScheduleInterval {
    pub fn new(name: impl Into<String>, interval_secs: u64, display: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval_secs,
            display: display.into(),
        }
    }

    /// The custom interval this plugin contributes.
    pub fn weekly() -> Self {
        Self::new(WEEKLY_INTERVAL, WEEK_IN_SECONDS, "Once Weekly")
    }
}

/// One registered recurring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Hook fired when the event runs.
    pub hook: String,
    /// Name of the recurrence interval.
    pub interval: String,
    pub next_run: i64,
}

/// Scheduler registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidHook(String),
    UnknownInterval(String),
    AlreadyScheduled(String),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHook(value) => write!(f, "hook name is invalid: `{value}`"),
            Self::UnknownInterval(value) => write!(f, "unknown schedule interval: `{value}`"),
            Self::AlreadyScheduled(value) => write!(f, "hook already scheduled: `{value}`"),
        }
    }
}

impl Error for ScheduleError {}

/// Host job scheduler as seen by the plugin.
pub trait JobScheduler {
    /// Adds or replaces one named interval, keeping all others.
    fn add_interval(&mut self, interval: ScheduleInterval);
    /// Next run time of the event bound to `hook`, if scheduled.
    fn next_scheduled(&self, hook: &str) -> Option<i64>;
    /// Schedules a recurring event firing `hook`.
    fn schedule_event(
        &mut self,
        first_run: i64,
        interval: &str,
        hook: &str,
    ) -> Result<(), ScheduleError>;
}

/// Midnight UTC of the Sunday closing the ISO week containing `now`.
///
/// Weeks start on Monday, so on a Sunday this is the same day.
pub fn sunday_this_week(now: i64) -> i64 {
    let day_secs = DAY_IN_SECONDS as i64;
    let day = now.div_euclid(day_secs);
    // 1970-01-01 was a Thursday; Monday == 0.
    let weekday = (day + 3).rem_euclid(7);
    (day + 6 - weekday) * day_secs
}

#[cfg(test)]
mod tests {
    use super::{sunday_this_week, ScheduleInterval, WEEK_IN_SECONDS};

    // 2024-06-12 is a Wednesday; 2024-06-16 is the following Sunday.
    const WED_2024_06_12_NOON: i64 = 1_718_193_600;
    const SUN_2024_06_16_MIDNIGHT: i64 = 1_718_496_000;

    #[test]
    fn weekly_interval_is_seven_days() {
        let weekly = ScheduleInterval::weekly();
        assert_eq!(weekly.interval_secs, 604_800);
        assert_eq!(weekly.interval_secs, WEEK_IN_SECONDS);
        assert_eq!(weekly.display, "Once Weekly");
    }

    #[test]
    fn sunday_this_week_rounds_forward_to_sunday_midnight() {
        assert_eq!(sunday_this_week(WED_2024_06_12_NOON), SUN_2024_06_16_MIDNIGHT);
    }

    #[test]
    fn sunday_this_week_is_idempotent_on_sunday() {
        assert_eq!(
            sunday_this_week(SUN_2024_06_16_MIDNIGHT + 3_600),
            SUN_2024_06_16_MIDNIGHT
        );
    }

    #[test]
    fn monday_belongs_to_the_following_sunday() {
        let monday = SUN_2024_06_16_MIDNIGHT + 86_400;
        assert_eq!(sunday_this_week(monday), SUN_2024_06_16_MIDNIGHT + 7 * 86_400);
    }
}
