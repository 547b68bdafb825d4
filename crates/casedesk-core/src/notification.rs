//! Notification intents and the sink they are handed to.
//!
//! Delivery is fire-and-forget: a failing sink never undoes the state
//! change that produced the intent. Callers log and drop sink errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CaseResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub appeal_id: Uuid,
    pub old_status_id: Uuid,
    pub new_status_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    AppealCreated {
        appeal_id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    StatusChanged(StatusChangedEvent),
}

impl NotificationEvent {
    pub fn appeal_id(&self) -> Uuid {
        match self {
            Self::AppealCreated { appeal_id, .. } => *appeal_id,
            Self::StatusChanged(event) => event.appeal_id,
        }
    }

    /// Short machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AppealCreated { .. } => "appeal.created",
            Self::StatusChanged(_) => "appeal.status_changed",
        }
    }
}

impl From<StatusChangedEvent> for NotificationEvent {
    fn from(event: StatusChangedEvent) -> Self {
        Self::StatusChanged(event)
    }
}

/// Delivery channel for notification intents (email, chat bot, ...).
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: &NotificationEvent) -> impl Future<Output = CaseResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_change_serializes_with_variant_tag() {
        let event: NotificationEvent = StatusChangedEvent {
            appeal_id: Uuid::nil(),
            old_status_id: Uuid::nil(),
            new_status_id: Uuid::max(),
            timestamp: Utc::now(),
        }
        .into();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json["StatusChanged"]["new_status_id"],
            "ffffffff-ffff-ffff-ffff-ffffffffffff"
        );
        let back: NotificationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind(), "appeal.status_changed");
    }
}
