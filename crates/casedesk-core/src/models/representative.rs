//! Representative domain model.
//!
//! A representative acts on behalf of exactly one organization. A main
//! representative may have subordinates; a representative is never its
//! own ancestor, and cannot be deleted while it still has subordinates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Representative {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub main_representative_id: Option<Uuid>,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub email: String,
    pub phone: String,
    pub is_shared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateRepresentative {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub main_representative_id: Option<Uuid>,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub email: String,
    pub phone: String,
    pub is_shared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRepresentative {
    /// `Some(Some(id))` = attach to a main representative, `Some(None)` =
    /// detach, `None` = no change.
    pub main_representative_id: Option<Option<Uuid>>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_shared: Option<bool>,
}
