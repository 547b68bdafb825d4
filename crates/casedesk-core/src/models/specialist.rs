//! Specialist domain model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal staff member handling appeals for a set of organizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department: Option<String>,
    pub organization_ids: BTreeSet<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateSpecialist {
    pub user_id: Uuid,
    pub department: Option<String>,
    pub organization_ids: BTreeSet<Uuid>,
}
