//! Sinks that surface alerts to the user.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use super::DisplayNotification;
use crate::{Error, Result};

/// Receives display-ready alerts, one call per alert, in display order.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sink name for logs.
    fn name(&self) -> &'static str;

    /// Show an alert.
    async fn display(&self, notification: &DisplayNotification) -> Result<()>;
}

/// Writes each alert as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn display(&self, notification: &DisplayNotification) -> Result<()> {
        info!(
            title = notification.title.as_deref().unwrap_or_default(),
            body = notification.body.as_deref().unwrap_or_default(),
            url = notification.navigation_url.as_deref().unwrap_or_default(),
            thumbnail = notification.thumbnail_url.as_deref().unwrap_or_default(),
            tag = notification.tag.as_deref().unwrap_or_default(),
            "New notification"
        );
        Ok(())
    }
}

/// Forwards alerts to a UI shell over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<DisplayNotification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<DisplayNotification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiving end for the UI.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DisplayNotification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn display(&self, notification: &DisplayNotification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .await
            .map_err(|_| Error::other("notification receiver closed"))
    }
}
