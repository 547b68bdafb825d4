//! Appeal domain model.
//!
//! An appeal is created by a representative, owned by the submitting user
//! and bound to the representative's organization for its whole lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub id: Uuid,
    /// Submitting user.
    pub user_id: Uuid,
    /// Frozen at creation from the submitter's organization.
    pub organization_id: Uuid,
    pub status_id: Uuid,
    pub responsible_user_id: Option<Uuid>,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub contact: AppealContact,
    pub solving: String,
    pub created_at: DateTime<Utc>,
    /// Completion time, present only while the appeal sits in a terminal status.
    pub actual_date: Option<DateTime<Utc>>,
}

/// Contact details of the person the appeal is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppealContact {
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub work_position: String,
}

/// Submitter-provided content of a new appeal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppealDraft {
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub contact: AppealContact,
}

/// Everything the entity store needs to insert an appeal.
#[derive(Debug, Clone)]
pub struct CreateAppeal {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub status_id: Uuid,
    pub draft: AppealDraft,
}

/// Requested changes to an existing appeal. Only these fields are
/// mutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppealChanges {
    pub status_id: Option<Uuid>,
    /// `Some(Some(id))` = assign, `Some(None)` = unassign, `None` = no change.
    pub responsible_user_id: Option<Option<Uuid>>,
    pub solving: Option<String>,
}

impl AppealChanges {
    pub fn is_empty(&self) -> bool {
        self.status_id.is_none() && self.responsible_user_id.is_none() && self.solving.is_none()
    }
}

/// Which appeals an actor is allowed to see in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppealScope {
    All,
    Organizations(Vec<Uuid>),
    SubmittedBy(Uuid),
}
