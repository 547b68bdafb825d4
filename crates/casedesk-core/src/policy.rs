//! Access policy for appeals.
//!
//! [`evaluate`] is a pure decision over an [`Actor`] and an [`Appeal`].
//! Rules are checked in precedence order and the first matching rule
//! decides:
//!
//! 1. Superusers may do anything.
//! 2. A representative of the appeal's organization may read, comment,
//!    handle files and update; only the original submitter may delete.
//! 3. A plain user who submitted the appeal may do anything to it.
//! 4. A specialist controlling the appeal's organization may read,
//!    comment, download files and update the responsible user and the
//!    solving text.
//! 5. Everyone else is denied.
//!
//! Only the status, the responsible user and the solving text can change
//! after creation; [`AppealField`] names nothing else.

use crate::error::{CaseError, CaseResult};
use crate::models::actor::{Actor, Role};
use crate::models::appeal::{Appeal, AppealChanges, AppealScope};
use crate::models::organization::UpdateOrganization;
use crate::models::representative::UpdateRepresentative;
use uuid::Uuid;

pub const NOT_ENOUGH_PERMISSIONS: &str = "not enough permissions";
pub const SUBMITTER_ONLY: &str = "only the submitter may delete this appeal";
pub const CONTACT_FIELDS_ONLY: &str =
    "representatives may only change contact and chat settings of their organization";
pub const HIERARCHY_ADMIN_ONLY: &str = "only a superuser may change the main representative";

/// Appeal fields an update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppealField {
    Status,
    ResponsibleUser,
    Solving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Update(AppealField),
    Delete,
    Comment,
    UploadFile,
    DownloadFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn into_result(self) -> CaseResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(CaseError::denied(reason)),
        }
    }
}

/// Decide whether `actor` may perform `operation` on `appeal`.
pub fn evaluate(actor: &Actor, appeal: &Appeal, operation: Operation) -> Decision {
    match &actor.role {
        Role::Superuser => Decision::Allowed,

        Role::Representative {
            organization_id, ..
        } if *organization_id == appeal.organization_id => match operation {
            Operation::Read
            | Operation::Comment
            | Operation::UploadFile
            | Operation::DownloadFile
            | Operation::Update(_) => Decision::Allowed,
            Operation::Delete if actor.user_id == appeal.user_id => Decision::Allowed,
            Operation::Delete => Decision::Denied(SUBMITTER_ONLY),
        },

        Role::PlainUser if actor.user_id == appeal.user_id => Decision::Allowed,

        Role::Specialist {
            controlled_organization_ids,
            ..
        } if controlled_organization_ids.contains(&appeal.organization_id) => match operation {
            Operation::Read | Operation::Comment | Operation::DownloadFile => Decision::Allowed,
            Operation::Update(AppealField::ResponsibleUser | AppealField::Solving) => {
                Decision::Allowed
            }
            _ => Decision::Denied(NOT_ENOUGH_PERMISSIONS),
        },

        _ => Decision::Denied(NOT_ENOUGH_PERMISSIONS),
    }
}

/// [`evaluate`] turned into a `Result` carrying `PermissionDenied`.
pub fn authorize(actor: &Actor, appeal: &Appeal, operation: Operation) -> CaseResult<()> {
    evaluate(actor, appeal, operation).into_result()
}

/// Authorize every field touched by `changes`. An empty change set needs
/// read access only.
pub fn authorize_changes(actor: &Actor, appeal: &Appeal, changes: &AppealChanges) -> CaseResult<()> {
    if changes.is_empty() {
        return authorize(actor, appeal, Operation::Read);
    }
    if changes.status_id.is_some() {
        authorize(actor, appeal, Operation::Update(AppealField::Status))?;
    }
    if changes.responsible_user_id.is_some() {
        authorize(actor, appeal, Operation::Update(AppealField::ResponsibleUser))?;
    }
    if changes.solving.is_some() {
        authorize(actor, appeal, Operation::Update(AppealField::Solving))?;
    }
    Ok(())
}

/// Listing scope consistent with the `Read` rules above.
pub fn visibility(actor: &Actor) -> AppealScope {
    match &actor.role {
        Role::Superuser => AppealScope::All,
        Role::Representative {
            organization_id, ..
        } => AppealScope::Organizations(vec![*organization_id]),
        Role::Specialist {
            controlled_organization_ids,
            ..
        } => AppealScope::Organizations(controlled_organization_ids.iter().copied().collect()),
        Role::PlainUser => AppealScope::SubmittedBy(actor.user_id),
    }
}

/// Gate for catalog and directory administration.
pub fn require_superuser(actor: &Actor) -> CaseResult<()> {
    if actor.is_superuser() {
        Ok(())
    } else {
        Err(CaseError::denied(NOT_ENOUGH_PERMISSIONS))
    }
}

/// Superusers may edit any organization; its own representatives may edit
/// contact details and the internal chat settings.
pub fn authorize_organization_update(
    actor: &Actor,
    organization_id: Uuid,
    changes: &UpdateOrganization,
) -> CaseResult<()> {
    match &actor.role {
        Role::Superuser => Ok(()),
        Role::Representative {
            organization_id: own,
            ..
        } if *own == organization_id => {
            if changes.is_contact_only() {
                Ok(())
            } else {
                Err(CaseError::denied(CONTACT_FIELDS_ONLY))
            }
        }
        _ => Err(CaseError::denied(NOT_ENOUGH_PERMISSIONS)),
    }
}

/// Superusers may edit any representative; a representative may edit its
/// own record but not move itself in the hierarchy.
pub fn authorize_representative_update(
    actor: &Actor,
    representative_id: Uuid,
    changes: &UpdateRepresentative,
) -> CaseResult<()> {
    match &actor.role {
        Role::Superuser => Ok(()),
        Role::Representative {
            representative_id: own,
            ..
        } if *own == representative_id => {
            if changes.main_representative_id.is_none() {
                Ok(())
            } else {
                Err(CaseError::denied(HIERARCHY_ADMIN_ONLY))
            }
        }
        _ => Err(CaseError::denied(NOT_ENOUGH_PERMISSIONS)),
    }
}
