use std::io::Write;

use ansi_term::Colour::Cyan;
use anyhow::Result;
use async_trait::async_trait;

use super::{Notification, NotificationSink, Permission};

/// Rings the terminal bell and prints the notification. Works anywhere there is a terminal.
pub struct ConsoleNotifier;

pub fn format_notification(notification: &Notification) -> String {
    format!(
        "{} {}",
        Cyan.bold().paint(format!("{}:", notification.title)),
        notification.body
    )
}

#[async_trait]
impl NotificationSink for ConsoleNotifier {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        // Leading carriage return puts the message over any live countdown line.
        writeln!(stdout, "\r\x07{}", format_notification(notification))?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::notification::{Notification, NotificationSink, Permission};

    use super::{format_notification, ConsoleNotifier};

    #[tokio::test]
    async fn test_console_always_granted() {
        assert_eq!(
            ConsoleNotifier.request_permission().await,
            Permission::Granted
        );
    }

    #[test]
    fn test_console_format_contains_message() {
        let text = format_notification(&Notification::reminder());
        assert!(text.contains("Water Reminder:"));
        assert!(text.ends_with("It's time to drink water!"));
    }
}
