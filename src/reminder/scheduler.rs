use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::{
    notification::{Notification, Notifier, Permission},
    utils::clock::Clock,
};

use super::{IntervalChange, IntervalMinutes, ReminderTimer, TickOutcome, TimerSnapshot};

const TICK_FREQUENCY: Duration = Duration::from_secs(1);

/// State shared between the scheduler and its tick task.
struct Shared {
    timer: Mutex<ReminderTimer>,
    publisher: watch::Sender<TimerSnapshot>,
    notifier: Notifier,
    clock: Box<dyn Clock>,
}

impl Shared {
    fn timer(&self) -> MutexGuard<'_, ReminderTimer> {
        // The timer is never left half updated, so a poisoned lock is still usable.
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct TickTask {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives a [ReminderTimer] in real time. While running, a background task ticks the timer once
/// per second and hands every expiry to the [Notifier].
///
/// The tick task is owned by the scheduler: [ReminderScheduler::stop], dropping the scheduler
/// and cancelling the `shutdown` token all end it, and no tick or notification happens
/// afterwards.
pub struct ReminderScheduler {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    task: Option<TickTask>,
}

impl ReminderScheduler {
    pub fn new(
        interval: IntervalMinutes,
        notifier: Notifier,
        clock: Box<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        let timer = ReminderTimer::new(interval);
        let (publisher, _) = watch::channel(timer.snapshot());
        Self {
            shared: Arc::new(Shared {
                timer: Mutex::new(timer),
                publisher,
                notifier,
                clock,
            }),
            shutdown,
            task: None,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.timer().snapshot()
    }

    /// Outcome of the permission request made by the last [ReminderScheduler::start].
    pub fn notification_permission(&self) -> Option<Permission> {
        self.shared.notifier.permission()
    }

    /// Receives a snapshot after every tick and every state change.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.publisher.subscribe()
    }

    /// Starts the countdown. Starting is the moment the user opts into reminders, so this is also
    /// where notification permission gets requested. Returns false if already running, or if the
    /// `shutdown` token was cancelled, after which the scheduler stays idle for good.
    pub async fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        if self.shutdown.is_cancelled() {
            // Drops the task left behind by the shutdown, if any.
            self.stop();
            debug!("Not starting reminder, shutdown was requested");
            return false;
        }

        self.shared.notifier.request_permission().await;

        let snapshot = {
            let mut timer = self.shared.timer();
            timer.start();
            timer.snapshot()
        };
        info!("Reminder started, next one in {}s", snapshot.seconds_remaining);
        self.shared.publisher.send_replace(snapshot);

        let cancellation = self.shutdown.child_token();
        let handle = tokio::spawn(
            run_ticks(self.shared.clone(), cancellation.clone())
                .instrument(info_span!("Reminder ticks")),
        );
        self.task = Some(TickTask {
            cancellation,
            handle,
        });
        true
    }

    /// Stops the countdown. Returns false if it wasn't running.
    pub fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };

        let snapshot = {
            let mut timer = self.shared.timer();
            timer.stop();
            task.cancellation.cancel();
            timer.snapshot()
        };
        task.handle.abort();
        info!("Reminder stopped");
        self.shared.publisher.send_replace(snapshot);
        true
    }

    /// Whether a tick task is alive. A task whose token got cancelled by the shutdown doesn't
    /// count.
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.cancellation.is_cancelled())
    }

    /// Starts when idle, stops when running. Returns whether the reminder now runs.
    pub async fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start().await
        }
    }

    /// Changes the interval. Ignored while the reminder runs.
    pub fn set_interval(&mut self, interval: IntervalMinutes) -> IntervalChange {
        let (change, snapshot) = {
            let mut timer = self.shared.timer();
            (timer.set_interval(interval), timer.snapshot())
        };
        match change {
            IntervalChange::Applied => {
                debug!("Reminder interval set to {interval}");
                self.shared.publisher.send_replace(snapshot);
            }
            IntervalChange::IgnoredWhileRunning => {
                debug!("Ignoring interval change to {interval}, reminder is running")
            }
        }
        change
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticks on whole second deadlines measured from the start, so slow ticks don't make the
/// countdown drift.
async fn run_ticks(shared: Arc<Shared>, cancellation: CancellationToken) {
    let mut deadline = shared.clock.instant();
    loop {
        deadline += TICK_FREQUENCY;

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return halt(&shared),
            _ = shared.clock.sleep_until(deadline) => ()
        }

        let snapshot = {
            let mut timer = shared.timer();
            if cancellation.is_cancelled() {
                drop(timer);
                return halt(&shared);
            }
            match timer.tick() {
                TickOutcome::Idle => return,
                TickOutcome::Counting => {}
                TickOutcome::Fired => {
                    info!("Reminder interval elapsed");
                    dispatch_notification(shared.clone(), cancellation.clone());
                }
            }
            timer.snapshot()
        };
        shared.publisher.send_replace(snapshot);
    }
}

/// Leaves the timer idle once its ticks end, so nobody sees a running timer that never moves.
fn halt(shared: &Shared) {
    let snapshot = {
        let mut timer = shared.timer();
        if !timer.stop() {
            return;
        }
        timer.snapshot()
    };
    debug!("Reminder ticks cancelled");
    shared.publisher.send_replace(snapshot);
}

/// Delivery runs on its own task so a slow notifier never holds up the countdown. It is tied to
/// the same cancellation as the ticks.
fn dispatch_notification(shared: Arc<Shared>, cancellation: CancellationToken) {
    tokio::spawn(async move {
        let notification = Notification::reminder();
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!("Dropping pending notification, reminder was stopped")
            }
            _ = shared.notifier.notify(&notification) => ()
        }
    });
}
