use std::{io::ErrorKind, process::Stdio};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Notification, NotificationSink, Permission};

cfg_if::cfg_if! {
    if #[cfg(target_os = "macos")] {
        const PROGRAM: Option<&str> = Some("osascript");
        const PROBE_ARGS: &[&str] = &["-e", "return"];

        fn arguments(notification: &Notification) -> Vec<String> {
            vec![
                "-e".into(),
                format!(
                    "display notification {:?} with title {:?}",
                    notification.body, notification.title
                ),
            ]
        }
    } else if #[cfg(unix)] {
        const PROGRAM: Option<&str> = Some("notify-send");
        const PROBE_ARGS: &[&str] = &["--version"];

        fn arguments(notification: &Notification) -> Vec<String> {
            vec![
                "--app-name=waterminder".into(),
                notification.title.clone(),
                notification.body.clone(),
            ]
        }
    } else {
        const PROGRAM: Option<&str> = None;
        const PROBE_ARGS: &[&str] = &[];

        fn arguments(_notification: &Notification) -> Vec<String> {
            vec![]
        }
    }
}

/// Shows notifications through the desktop environment by running the platform's notification
/// tool: `notify-send` on Linux and `osascript` on macOS. Other platforms are unsupported.
pub struct DesktopNotifier;

#[async_trait]
impl NotificationSink for DesktopNotifier {
    async fn request_permission(&self) -> Permission {
        let Some(program) = PROGRAM else {
            return Permission::Unsupported;
        };

        let status = Command::new(program)
            .args(PROBE_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Permission::Granted,
            Ok(status) => {
                debug!("{program} probe exited with {status}");
                Permission::Denied
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Permission::Unsupported,
            Err(e) => {
                debug!("Couldn't run {program}: {e}");
                Permission::Denied
            }
        }
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        let Some(program) = PROGRAM else {
            bail!("Desktop notifications aren't supported on this platform");
        };

        let status = Command::new(program)
            .args(arguments(notification))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            bail!("{program} exited with {status}");
        }
        Ok(())
    }
}

#[cfg(all(test, unix, not(target_os = "macos")))]
mod tests {
    use crate::notification::Notification;

    use super::arguments;

    #[test]
    fn test_notify_send_arguments() {
        assert_eq!(
            arguments(&Notification::reminder()),
            vec![
                "--app-name=waterminder".to_string(),
                "Water Reminder".to_string(),
                "It's time to drink water!".to_string(),
            ]
        );
    }
}
