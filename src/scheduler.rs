//! Daily trigger for pipeline runs.
//!
//! The scheduler polls the local wall clock at a fixed interval and fires the job once the next
//! trigger instant has passed. A run always completes before the next poll, so runs never overlap.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use log::{debug, error, info};

use crate::config::ScheduleConfig;
use crate::error::ConfigError;

/// "Every day at `at`, checked every `poll_interval`."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    poll_interval: Duration,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, poll_interval: Duration) -> Self {
        Self { at, poll_interval }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.trigger_time()?,
            Duration::from_secs(config.poll_interval_secs),
        ))
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// First trigger instant strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            return today;
        }
        match now.date().checked_add_days(Days::new(1)) {
            Some(tomorrow) => tomorrow.and_time(self.at),
            None => today,
        }
    }
}

/// Tracks the pending trigger of a [`DailySchedule`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    schedule: DailySchedule,
    next_run: NaiveDateTime,
}

impl Scheduler {
    /// Schedule the first run after `now`.
    pub fn new(schedule: DailySchedule, now: NaiveDateTime) -> Self {
        Self {
            schedule,
            next_run: schedule.next_run_after(now),
        }
    }

    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Run `job` if it is due at `now`, then schedule the following trigger.
    ///
    /// Returns `None` when nothing was due.
    pub fn run_pending<T, F>(&mut self, now: NaiveDateTime, job: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        if !self.is_due(now) {
            return None;
        }
        let out = job();
        self.next_run = self.schedule.next_run_after(now);
        Some(out)
    }
}

/// Poll forever, running `job` once per day at the configured time.
///
/// A failed run is logged and the schedule continues; the next attempt is the next day's trigger.
pub fn run_daily<T, E, F>(schedule: DailySchedule, mut job: F) -> !
where
    T: Display,
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let mut scheduler = Scheduler::new(schedule, Local::now().naive_local());
    info!(
        "Scheduler started: daily at {}, next run {}",
        schedule.at().format("%H:%M"),
        scheduler.next_run()
    );

    loop {
        let now = Local::now().naive_local();
        match scheduler.run_pending(now, &mut job) {
            Some(Ok(outcome)) => info!("Scheduled run finished: {outcome}"),
            Some(Err(e)) => error!("Scheduled run failed: {e}"),
            None => debug!("Next run at {}", scheduler.next_run()),
        }
        thread::sleep(schedule.poll_interval());
    }
}
