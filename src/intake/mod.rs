//! Daily intake bookkeeping. [IntakeStore] owns the current volume, clamps it to the daily goal,
//! writes every change through to a [KeyValueStore] and starts over when the calendar day
//! changes.

pub mod persistence;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    storage::KeyValueStore,
    utils::{
        clock::Clock,
        percentage::{fill_percentage, Percentage},
    },
};

pub const DAILY_GOAL_ML: u32 = 2000;
pub const GLASS_SIZE_ML: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeConfig {
    pub daily_goal_ml: u32,
    pub glass_size_ml: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            daily_goal_ml: DAILY_GOAL_ML,
            glass_size_ml: GLASS_SIZE_ML,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeState {
    /// Always within [0, daily goal].
    pub volume_ml: u32,
    pub last_updated: DateTime<Utc>,
}

pub struct IntakeStore<S: KeyValueStore> {
    storage: S,
    clock: Box<dyn Clock>,
    config: IntakeConfig,
    state: IntakeState,
    publisher: watch::Sender<IntakeState>,
}

impl<S: KeyValueStore> IntakeStore<S> {
    /// Restores state from `storage`. Missing or unreadable values fall back to 0 ml and the
    /// current time, so a broken state file never prevents startup.
    pub async fn load(storage: S, clock: Box<dyn Clock>, config: IntakeConfig) -> Self {
        let stored = persistence::load(&storage).await;
        debug!("Restored intake {:?}", stored);

        let state = IntakeState {
            volume_ml: stored.volume_ml.unwrap_or(0).min(config.daily_goal_ml),
            last_updated: stored.last_updated.unwrap_or_else(|| clock.time()),
        };
        let (publisher, _) = watch::channel(state);

        let mut store = Self {
            storage,
            clock,
            config,
            state,
            publisher,
        };
        store.check_daily_rollover().await;
        store
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn config(&self) -> IntakeConfig {
        self.config
    }

    pub fn fill_percentage(&self) -> Percentage {
        fill_percentage(self.state.volume_ml, self.config.daily_goal_ml)
    }

    pub fn is_at_goal(&self) -> bool {
        self.state.volume_ml >= self.config.daily_goal_ml
    }

    pub fn is_empty(&self) -> bool {
        self.state.volume_ml == 0
    }

    /// Every state published after this call. The receiver starts out holding the current state.
    pub fn subscribe(&self) -> watch::Receiver<IntakeState> {
        self.publisher.subscribe()
    }

    /// Adds one glass, never going past the daily goal.
    pub async fn add_glass(&mut self) -> IntakeState {
        self.check_daily_rollover().await;
        let volume_ml = self
            .state
            .volume_ml
            .saturating_add(self.config.glass_size_ml)
            .min(self.config.daily_goal_ml);
        self.apply(volume_ml).await
    }

    /// Removes one glass, never going below zero.
    pub async fn remove_glass(&mut self) -> IntakeState {
        self.check_daily_rollover().await;
        let volume_ml = self.state.volume_ml.saturating_sub(self.config.glass_size_ml);
        self.apply(volume_ml).await
    }

    pub async fn reset(&mut self) -> IntakeState {
        self.apply(0).await
    }

    /// Starts the day over if the last update happened on another calendar day. Returns whether
    /// that happened.
    pub async fn check_daily_rollover(&mut self) -> bool {
        let now = self.clock.time();
        let last_day = self.clock.calendar_day(self.state.last_updated);
        let today = self.clock.calendar_day(now);
        if last_day == today {
            return false;
        }

        info!(
            "Day changed from {last_day} to {today}, dropping {}ml",
            self.state.volume_ml
        );
        self.apply(0).await;
        true
    }

    async fn apply(&mut self, volume_ml: u32) -> IntakeState {
        self.state = IntakeState {
            volume_ml,
            last_updated: self.clock.time(),
        };

        if let Err(e) = persistence::save(&self.storage, &self.state).await {
            // The in-memory state stays authoritative for this session.
            warn!("Failed to persist intake {:?}: {e:?}", self.state);
        }

        self.publisher.send_replace(self.state);
        self.state
    }
}
