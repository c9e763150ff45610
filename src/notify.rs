//! Notification display for push messages

use crate::error::ShelterResult;
use async_trait::async_trait;
use console::style;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A notification to show the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Displays notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> ShelterResult<()>;
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: &Notification) -> ShelterResult<()> {
        info!(title = %notification.title, "{}", notification.body);
        Ok(())
    }
}

/// Prints notifications to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn show(&self, notification: &Notification) -> ShelterResult<()> {
        println!(
            "{} {}",
            style(format!("[{}]", notification.title)).cyan().bold(),
            notification.body
        );
        Ok(())
    }
}
