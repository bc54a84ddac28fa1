//! Delivery of reminder notifications. Everything here is best effort: a missing notifier, a
//! denied permission or a failing delivery never surfaces as an error to the reminder loop.

pub mod console;
pub mod desktop;

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const REMINDER_TITLE: &str = "Water Reminder";
pub const REMINDER_BODY: &str = "It's time to drink water!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn reminder() -> Self {
        Self {
            title: REMINDER_TITLE.into(),
            body: REMINDER_BODY.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The environment has no way of showing notifications at all.
    Unsupported,
}

/// Contract every way of showing notifications implements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn request_permission(&self) -> Permission;

    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Gate in front of a [NotificationSink]. Permission is asked for once, when the user turns the
/// reminder on, and every later notification is dropped unless it was granted.
pub struct Notifier {
    sink: Box<dyn NotificationSink>,
    permission: Mutex<Option<Permission>>,
}

impl Notifier {
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        Self {
            sink,
            permission: Mutex::new(None),
        }
    }

    /// `None` until [Notifier::request_permission] has been called.
    pub fn permission(&self) -> Option<Permission> {
        self.permission.lock().ok().and_then(|v| *v)
    }

    pub async fn request_permission(&self) -> Permission {
        let permission = self.sink.request_permission().await;
        info!("Notification permission {permission:?}");
        if let Ok(mut v) = self.permission.lock() {
            *v = Some(permission);
        }
        permission
    }

    pub async fn notify(&self, notification: &Notification) {
        match self.permission() {
            Some(Permission::Granted) => {
                debug!("Showing notification {:?}", notification);
                if let Err(e) = self.sink.notify(notification).await {
                    warn!("Failed to show notification {:?}: {e:?}", notification);
                }
            }
            permission => {
                debug!(
                    "Skipping notification {:?}, permission is {permission:?}",
                    notification
                )
            }
        }
    }
}
