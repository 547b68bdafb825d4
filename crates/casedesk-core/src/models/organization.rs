//! Organization domain model.
//!
//! Organizations are the parties appeals are filed on behalf of. The
//! policy only cares about membership: which organization a
//! representative acts for and which organizations a specialist controls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Chat the bot posts appeal updates to, if any.
    pub telegram_chat_id: Option<String>,
    pub send_notifications_to_internal_chat: bool,
    pub call_internal_specialists: bool,
    /// Whether the organization closes appeals with its own status.
    pub custom_appeal_completion: bool,
    pub custom_appeal_completion_status_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub telegram_chat_id: Option<String>,
    pub send_notifications_to_internal_chat: bool,
    pub call_internal_specialists: bool,
    pub custom_appeal_completion: bool,
    pub custom_appeal_completion_status_id: Option<Uuid>,
}

impl Default for CreateOrganization {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            telegram_chat_id: None,
            send_notifications_to_internal_chat: true,
            call_internal_specialists: true,
            custom_appeal_completion: false,
            custom_appeal_completion_status_id: None,
        }
    }
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram_chat_id: Option<Option<String>>,
    pub send_notifications_to_internal_chat: Option<bool>,
    pub call_internal_specialists: Option<bool>,
    pub custom_appeal_completion: Option<bool>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub custom_appeal_completion_status_id: Option<Option<Uuid>>,
}

impl UpdateOrganization {
    /// True when only contact details and the internal chat settings change.
    pub fn is_contact_only(&self) -> bool {
        self.name.is_none()
            && self.call_internal_specialists.is_none()
            && self.custom_appeal_completion.is_none()
            && self.custom_appeal_completion_status_id.is_none()
    }
}
