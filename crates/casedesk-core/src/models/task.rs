//! Task domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted `status` and `gitlab_url`.
pub const TASK_FIELD_MAX_LEN: usize = 255;

/// Follow-up work item opened against an appeal, typically mirrored by an
/// issue in an external tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub appeal_id: Uuid,
    /// Author; only the author may change or remove the task.
    pub user_id: Uuid,
    pub gitlab_url: String,
    /// Free-form tracker status, e.g. "opened".
    pub status: String,
    pub description: String,
}

/// What a caller supplies; the appeal and the author come from the request
/// context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub gitlab_url: String,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub appeal_id: Uuid,
    pub user_id: Uuid,
    pub gitlab_url: String,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub gitlab_url: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.gitlab_url.is_none() && self.status.is_none() && self.description.is_none()
    }
}
