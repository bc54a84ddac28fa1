//! Repeating reminder countdown. [ReminderTimer] is the plain state machine and knows nothing
//! about real time, [scheduler::ReminderScheduler] drives it once per second and hands expiries
//! to the notifier.
//!
//! ```text
//! Idle --start--> Running --stop--> Idle
//!                 Running --tick at 0--> Running (rearmed, notification fired)
//! ```

pub mod scheduler;

use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// Reminder period. Only multiples of 15 minutes between 15 and 120 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntervalMinutes(u32);

impl IntervalMinutes {
    pub const MIN: u32 = 15;
    pub const MAX: u32 = 120;
    pub const STEP: u32 = 15;

    pub fn new_opt(minutes: u32) -> Option<IntervalMinutes> {
        if (Self::MIN..=Self::MAX).contains(&minutes) && minutes % Self::STEP == 0 {
            Some(IntervalMinutes(minutes))
        } else {
            None
        }
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn seconds(&self) -> u32 {
        self.0 * 60
    }

    /// Every allowed interval, shortest first.
    pub fn all() -> impl Iterator<Item = IntervalMinutes> {
        (Self::MIN..=Self::MAX)
            .step_by(Self::STEP as usize)
            .map(IntervalMinutes)
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        IntervalMinutes(30)
    }
}

impl Display for IntervalMinutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}min", self.0)
    }
}

impl FromStr for IntervalMinutes {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_suffix("min")
            .or_else(|| s.strip_suffix('m'))
            .unwrap_or(s)
            .trim_end();
        let minutes = digits.parse::<u32>()?;
        IntervalMinutes::new_opt(minutes).ok_or_else(|| {
            let allowed = IntervalMinutes::all()
                .map(|v| v.minutes().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("Interval must be one of {allowed} minutes, got {s}")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer isn't running, nothing changed.
    Idle,
    Counting,
    /// Countdown reached zero and was rearmed. Happens once per interval.
    Fired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalChange {
    Applied,
    /// The interval is locked while the timer runs. Stop it first.
    IgnoredWhileRunning,
}

/// Copy of the timer state handed out to whoever displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub is_active: bool,
    pub seconds_remaining: u32,
    pub interval: IntervalMinutes,
}

#[derive(Debug, Clone)]
pub struct ReminderTimer {
    interval: IntervalMinutes,
    is_active: bool,
    seconds_remaining: u32,
}

impl ReminderTimer {
    pub fn new(interval: IntervalMinutes) -> Self {
        Self {
            interval,
            is_active: false,
            seconds_remaining: interval.seconds(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_active: self.is_active,
            seconds_remaining: self.seconds_remaining,
            interval: self.interval,
        }
    }

    /// Arms a full interval. Returns false if the timer was already running, in which case the
    /// countdown is left alone.
    pub fn start(&mut self) -> bool {
        if self.is_active {
            return false;
        }
        self.is_active = true;
        self.seconds_remaining = self.interval.seconds();
        true
    }

    /// Returns false if the timer wasn't running.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }

    /// Flips between running and idle, returning whether the timer now runs.
    pub fn toggle(&mut self) -> bool {
        if self.is_active {
            self.stop();
        } else {
            self.start();
        }
        self.is_active
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active {
            return TickOutcome::Idle;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.seconds_remaining = self.interval.seconds();
            TickOutcome::Fired
        } else {
            TickOutcome::Counting
        }
    }

    pub fn set_interval(&mut self, interval: IntervalMinutes) -> IntervalChange {
        if self.is_active {
            return IntervalChange::IgnoredWhileRunning;
        }
        self.interval = interval;
        self.seconds_remaining = interval.seconds();
        IntervalChange::Applied
    }
}

impl Default for ReminderTimer {
    fn default() -> Self {
        Self::new(IntervalMinutes::default())
    }
}
