//! The authenticated identity attempting an operation.
//!
//! The role is resolved once, when the actor context is loaded, so an
//! actor always carries exactly one classification.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Superuser,
    Representative {
        representative_id: Uuid,
        organization_id: Uuid,
    },
    Specialist {
        specialist_id: Uuid,
        controlled_organization_ids: BTreeSet<Uuid>,
    },
    PlainUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_active: bool,
    pub role: Role,
}

impl Actor {
    pub fn superuser(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_active: true,
            role: Role::Superuser,
        }
    }

    pub fn representative(user_id: Uuid, representative_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            user_id,
            is_active: true,
            role: Role::Representative {
                representative_id,
                organization_id,
            },
        }
    }

    pub fn specialist(
        user_id: Uuid,
        specialist_id: Uuid,
        controlled: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        Self {
            user_id,
            is_active: true,
            role: Role::Specialist {
                specialist_id,
                controlled_organization_ids: controlled.into_iter().collect(),
            },
        }
    }

    pub fn plain(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_active: true,
            role: Role::PlainUser,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self.role, Role::Superuser)
    }

    /// Organization the actor represents, if it is a representative.
    pub fn represented_organization(&self) -> Option<Uuid> {
        match self.role {
            Role::Representative {
                organization_id, ..
            } => Some(organization_id),
            _ => None,
        }
    }
}
