//! In-process job scheduler adapter.
//!
//! Keeps intervals and events in memory and hands out due hooks when the
//! embedding binary polls it. Missed runs collapse into one firing.
//! Short-lived hosts carry state between runs through `load`/`save`.

use super::{
    JobScheduler, ScheduleError, ScheduleInterval, ScheduledEvent, DAILY_INTERVAL, DAY_IN_SECONDS,
};
use crate::repo::note_repo::{RepoError, RepoResult};
use crate::repo::settings_repo::{SettingsStore, SETTING_SCHEDULER_STATE};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchedulerState {
    intervals: Vec<ScheduleInterval>,
    events: Vec<ScheduledEvent>,
}

/// Scheduler registry living in the current process.
#[derive(Debug, Default)]
pub struct InProcessScheduler {
    intervals: BTreeMap<String, ScheduleInterval>,
    events: BTreeMap<String, ScheduledEvent>,
}

impl InProcessScheduler {
    /// Creates a scheduler with no intervals and no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler pre-populated with the host's built-in intervals.
    pub fn with_host_intervals() -> Self {
        let mut scheduler = Self::new();
        scheduler.add_interval(ScheduleInterval::new("hourly", 3_600, "Once Hourly"));
        scheduler.add_interval(ScheduleInterval::new(
            "twicedaily",
            DAY_IN_SECONDS / 2,
            "Twice Daily",
        ));
        scheduler.add_interval(ScheduleInterval::new(
            DAILY_INTERVAL,
            DAY_IN_SECONDS,
            "Once Daily",
        ));
        scheduler
    }

    /// Restores the state last written by [`InProcessScheduler::save`] on
    /// top of the host intervals.
    ///
    /// # Errors
    /// - `InvalidData` when the stored state is not readable.
    pub fn load<S: SettingsStore + ?Sized>(settings: &S) -> RepoResult<Self> {
        let mut scheduler = Self::with_host_intervals();
        let Some(raw) = settings.get(SETTING_SCHEDULER_STATE)? else {
            return Ok(scheduler);
        };
        let state: SchedulerState = serde_json::from_str(&raw).map_err(|err| {
            RepoError::InvalidData(format!("setting `{SETTING_SCHEDULER_STATE}`: {err}"))
        })?;
        for interval in state.intervals {
            scheduler.add_interval(interval);
        }
        for event in state.events {
            scheduler.events.insert(event.hook.clone(), event);
        }
        debug!(
            "event=schedule_load module=schedule status=ok events={}",
            scheduler.events.len()
        );
        Ok(scheduler)
    }

    /// Writes every interval and event to `settings`.
    pub fn save<S: SettingsStore + ?Sized>(&self, settings: &S) -> RepoResult<()> {
        let state = SchedulerState {
            intervals: self.intervals.values().cloned().collect(),
            events: self.events.values().cloned().collect(),
        };
        let raw = serde_json::to_string(&state)
            .map_err(|err| RepoError::InvalidData(format!("scheduler state: {err}")))?;
        settings.set(SETTING_SCHEDULER_STATE, &raw)
    }

    /// Known interval names, sorted.
    pub fn interval_names(&self) -> Vec<String> {
        self.intervals.keys().cloned().collect()
    }

    pub fn interval(&self, name: &str) -> Option<&ScheduleInterval> {
        self.intervals.get(name)
    }

    /// Registered events, sorted by hook name.
    pub fn events(&self) -> Vec<&ScheduledEvent> {
        self.events.values().collect()
    }

    /// Returns hooks whose next run is at or before `now` and advances each
    /// of them past `now` by whole intervals.
    pub fn take_due(&mut self, now: i64) -> Vec<String> {
        let mut due = Vec::new();
        for event in self.events.values_mut() {
            if event.next_run > now {
                continue;
            }
            let period = i128::from(
                self.intervals
                    .get(event.interval.as_str())
                    .map_or(DAY_IN_SECONDS, |interval| interval.interval_secs)
                    .max(1),
            );
            // Widened so far-past runs and huge periods cannot overflow.
            let behind = i128::from(now) - i128::from(event.next_run);
            let next_run = i128::from(event.next_run) + (behind / period + 1) * period;
            event.next_run = i64::try_from(next_run).unwrap_or(i64::MAX);
            debug!(
                "event=schedule_due module=schedule status=ok hook={} next_run={}",
                event.hook, event.next_run
            );
            due.push(event.hook.clone());
        }
        due
    }
}

impl JobScheduler for InProcessScheduler {
    fn add_interval(&mut self, interval: ScheduleInterval) {
        self.intervals.insert(interval.name.clone(), interval);
    }

    fn next_scheduled(&self, hook: &str) -> Option<i64> {
        self.events.get(hook).map(|event| event.next_run)
    }

    fn schedule_event(
        &mut self,
        first_run: i64,
        interval: &str,
        hook: &str,
    ) -> Result<(), ScheduleError> {
        let hook = hook.trim();
        if hook.is_empty() {
            return Err(ScheduleError::InvalidHook(hook.to_string()));
        }
        if !self.intervals.contains_key(interval) {
            return Err(ScheduleError::UnknownInterval(interval.to_string()));
        }
        if self.events.contains_key(hook) {
            return Err(ScheduleError::AlreadyScheduled(hook.to_string()));
        }

        self.events.insert(
            hook.to_string(),
            ScheduledEvent {
                hook: hook.to_string(),
                interval: interval.to_string(),
                next_run: first_run,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InProcessScheduler;
    use crate::schedule::{JobScheduler, ScheduleError, ScheduleInterval, WEEKLY_INTERVAL};

    #[test]
    fn adding_weekly_keeps_host_intervals() {
        let mut scheduler = InProcessScheduler::with_host_intervals();
        scheduler.add_interval(ScheduleInterval::weekly());
        assert_eq!(
            scheduler.interval_names(),
            vec!["daily", "hourly", "twicedaily", "weekly"]
        );
    }

    #[test]
    fn schedule_event_requires_known_interval() {
        let mut scheduler = InProcessScheduler::with_host_intervals();
        let err = scheduler
            .schedule_event(0, WEEKLY_INTERVAL, "admin_weekly")
            .unwrap_err();
        assert_eq!(err, ScheduleError::UnknownInterval("weekly".to_string()));
    }

    #[test]
    fn take_due_fires_once_and_advances_past_now() {
        let mut scheduler = InProcessScheduler::with_host_intervals();
        scheduler.schedule_event(100, "daily", "admin_daily").unwrap();

        assert!(scheduler.take_due(99).is_empty());
        // Three missed days still fire once.
        let now = 100 + 3 * 86_400 + 5;
        assert_eq!(scheduler.take_due(now), vec!["admin_daily".to_string()]);
        assert_eq!(scheduler.next_scheduled("admin_daily"), Some(100 + 4 * 86_400));
        assert!(scheduler.take_due(now).is_empty());
    }

    #[test]
    fn take_due_handles_extreme_run_times() {
        let now = 1_718_193_600;
        let mut scheduler = InProcessScheduler::with_host_intervals();
        scheduler.schedule_event(i64::MIN, "daily", "ancient").unwrap();
        scheduler.add_interval(ScheduleInterval::new("forever", u64::MAX, "Forever"));
        scheduler.schedule_event(0, "forever", "rare").unwrap();

        let mut due = scheduler.take_due(now);
        due.sort();
        assert_eq!(due, vec!["ancient".to_string(), "rare".to_string()]);

        let next = scheduler.next_scheduled("ancient").unwrap();
        assert!(next > now && next <= now + 86_400);
        assert_eq!(scheduler.next_scheduled("rare"), Some(i64::MAX));
        assert!(scheduler.take_due(now).is_empty());
    }
}
