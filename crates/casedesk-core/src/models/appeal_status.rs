//! Appeal status catalog entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of the status catalog.
///
/// Statuses flagged `is_final` are terminal: entering one stamps the
/// appeal's completion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealStatus {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_final: bool,
    /// HEX color code, `#RRGGBB`.
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppealStatus {
    pub name: String,
    pub description: Option<String>,
    pub is_final: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppealStatus {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_final: Option<bool>,
    pub color: Option<String>,
}

pub const DEFAULT_STATUS_COLOR: &str = "#000000";

/// Returns `true` for `#` followed by exactly six hex digits.
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
