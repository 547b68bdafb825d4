//! Notification sinks.

use casedesk_core::error::CaseResult;
use casedesk_core::notification::{NotificationEvent, NotificationSink};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::WorkflowError;

/// Writes every intent to the log and nothing else.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    async fn emit(&self, event: &NotificationEvent) -> CaseResult<()> {
        info!(
            kind = event.kind(),
            appeal_id = %event.appeal_id(),
            "Notification intent"
        );
        Ok(())
    }
}

/// Hands intents to a delivery task over an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::Sender<NotificationEvent>,
}

impl ChannelNotificationSink {
    pub fn new(tx: mpsc::Sender<NotificationEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of a channel of
    /// `capacity` intents.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl NotificationSink for ChannelNotificationSink {
    async fn emit(&self, event: &NotificationEvent) -> CaseResult<()> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| WorkflowError::ChannelClosed)?;
        Ok(())
    }
}
