//! SurrealDB repository implementations.

mod actor;
mod appeal;
mod appeal_status;
mod attachment;
mod comment;
mod organization;
mod representative;
mod specialist;
mod stop_interval;
mod task;
mod user;

pub use actor::SurrealActorRepository;
pub use appeal::SurrealAppealRepository;
pub use appeal_status::SurrealAppealStatusRepository;
pub use attachment::SurrealAttachmentRepository;
pub use comment::SurrealCommentRepository;
pub use organization::SurrealOrganizationRepository;
pub use representative::SurrealRepresentativeRepository;
pub use specialist::SurrealSpecialistRepository;
pub use stop_interval::SurrealStopIntervalRepository;
pub use task::SurrealTaskRepository;
pub use user::{SurrealUserRepository, verify_password};

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

impl CountRow {
    fn total(rows: Vec<CountRow>) -> u64 {
        rows.first().map(|r| r.total).unwrap_or(0)
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

fn parse_opt_uuid(raw: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(&s, what)).transpose()
}
