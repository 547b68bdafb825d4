//! Appeal status transitions.
//!
//! There is no fixed status graph: any catalog status may follow any
//! other. The only side effect that depends on the target is the
//! completion timestamp, which is present exactly while the appeal is in
//! an `is_final` status.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CaseError, CaseResult};
use crate::models::appeal::Appeal;
use crate::models::appeal_status::AppealStatus;
use crate::notification::StatusChangedEvent;

/// Snapshot of the status catalog, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StatusCatalog {
    statuses: HashMap<Uuid, AppealStatus>,
}

impl StatusCatalog {
    pub fn get(&self, id: Uuid) -> Option<&AppealStatus> {
        self.statuses.get(&id)
    }

    /// Look up `id`, failing with `UnknownStatus` when it is not cataloged.
    pub fn require(&self, id: Uuid) -> CaseResult<&AppealStatus> {
        self.get(id).ok_or_else(|| CaseError::UnknownStatus { id: id.to_string() })
    }

    pub fn find_by_name(&self, name: &str) -> Option<&AppealStatus> {
        self.statuses.values().find(|s| s.name == name)
    }

    pub fn is_final(&self, id: Uuid) -> bool {
        self.get(id).is_some_and(|s| s.is_final)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppealStatus> {
        self.statuses.values()
    }
}

impl FromIterator<AppealStatus> for StatusCatalog {
    fn from_iter<I: IntoIterator<Item = AppealStatus>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

/// Result of [`apply_transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub appeal: Appeal,
    /// `None` when the transition was a no-op.
    pub event: Option<StatusChangedEvent>,
}

impl TransitionOutcome {
    pub fn changed(&self) -> bool {
        self.event.is_some()
    }
}

/// Move `appeal` to `new_status_id`.
///
/// The input appeal is never modified; on error nothing has been applied.
/// `now` is the transition time. A completion stamp is never earlier than
/// the appeal's creation, and re-entering a terminal status always moves
/// the stamp forward.
pub fn apply_transition(
    appeal: &Appeal,
    new_status_id: Uuid,
    catalog: &StatusCatalog,
    now: DateTime<Utc>,
) -> CaseResult<TransitionOutcome> {
    let target = catalog.require(new_status_id)?;

    if appeal.status_id == new_status_id {
        return Ok(TransitionOutcome {
            appeal: appeal.clone(),
            event: None,
        });
    }

    let mut next = appeal.clone();
    next.status_id = new_status_id;
    next.actual_date = if target.is_final {
        let mut stamp = now.max(appeal.created_at);
        if let Some(previous) = appeal.actual_date
            && stamp <= previous
        {
            stamp = previous + Duration::microseconds(1);
        }
        Some(stamp)
    } else {
        None
    };

    let event = StatusChangedEvent {
        appeal_id: appeal.id,
        old_status_id: appeal.status_id,
        new_status_id,
        timestamp: now,
    };

    Ok(TransitionOutcome {
        appeal: next,
        event: Some(event),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appeal::AppealContact;

    struct Fixture {
        catalog: StatusCatalog,
        new: Uuid,
        in_progress: Uuid,
        resolved: Uuid,
        rejected: Uuid,
    }

    fn status(name: &str, is_final: bool) -> AppealStatus {
        AppealStatus {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            is_final,
            color: "#000000".into(),
        }
    }

    fn fixture() -> Fixture {
        let new = status("New", false);
        let in_progress = status("In progress", false);
        let resolved = status("Resolved", true);
        let rejected = status("Rejected", true);
        Fixture {
            new: new.id,
            in_progress: in_progress.id,
            resolved: resolved.id,
            rejected: rejected.id,
            catalog: [new, in_progress, resolved, rejected].into_iter().collect(),
        }
    }

    fn appeal(status_id: Uuid) -> Appeal {
        Appeal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            status_id,
            responsible_user_id: None,
            subject: "VPN is down".into(),
            description: String::new(),
            priority: "normal".into(),
            contact: AppealContact::default(),
            solving: String::new(),
            created_at: Utc::now() - Duration::hours(1),
            actual_date: None,
        }
    }

    #[test]
    fn same_status_is_a_noop() {
        let f = fixture();
        let current = appeal(f.new);
        let outcome = apply_transition(&current, f.new, &f.catalog, Utc::now()).unwrap();
        assert_eq!(outcome.appeal, current);
        assert!(outcome.event.is_none());
        assert!(!outcome.changed());
    }

    #[test]
    fn entering_final_status_stamps_completion() {
        let f = fixture();
        let current = appeal(f.new);
        let now = Utc::now();
        let outcome = apply_transition(&current, f.resolved, &f.catalog, now).unwrap();

        assert_eq!(outcome.appeal.status_id, f.resolved);
        let stamped = outcome.appeal.actual_date.expect("completion time");
        assert!(stamped >= current.created_at);

        let event = outcome.event.expect("event");
        assert_eq!(event.appeal_id, current.id);
        assert_eq!(event.old_status_id, f.new);
        assert_eq!(event.new_status_id, f.resolved);
        assert_eq!(event.timestamp, now);
    }

    #[test]
    fn stamp_never_precedes_creation() {
        let f = fixture();
        let current = appeal(f.new);
        let skewed = current.created_at - Duration::minutes(5);
        let outcome = apply_transition(&current, f.resolved, &f.catalog, skewed).unwrap();
        assert_eq!(outcome.appeal.actual_date, Some(current.created_at));
    }

    #[test]
    fn non_final_transitions_leave_completion_empty() {
        let f = fixture();
        let current = appeal(f.new);
        let outcome = apply_transition(&current, f.in_progress, &f.catalog, Utc::now()).unwrap();
        assert_eq!(outcome.appeal.status_id, f.in_progress);
        assert!(outcome.appeal.actual_date.is_none());
        assert!(outcome.changed());
    }

    #[test]
    fn moving_between_final_statuses_restamps() {
        let f = fixture();
        let t1 = Utc::now();
        let first = apply_transition(&appeal(f.new), f.resolved, &f.catalog, t1).unwrap();
        let t2 = t1 + Duration::seconds(30);
        let second = apply_transition(&first.appeal, f.rejected, &f.catalog, t2).unwrap();

        assert_eq!(first.appeal.actual_date, Some(t1));
        assert_eq!(second.appeal.actual_date, Some(t2));
    }

    #[test]
    fn restamp_moves_forward_even_with_equal_clock() {
        let f = fixture();
        let t = Utc::now();
        let first = apply_transition(&appeal(f.new), f.resolved, &f.catalog, t).unwrap();
        let second = apply_transition(&first.appeal, f.rejected, &f.catalog, t).unwrap();
        assert!(second.appeal.actual_date.unwrap() > first.appeal.actual_date.unwrap());
    }

    #[test]
    fn reopening_clears_completion() {
        let f = fixture();
        let closed = apply_transition(&appeal(f.new), f.resolved, &f.catalog, Utc::now()).unwrap();
        let reopened =
            apply_transition(&closed.appeal, f.in_progress, &f.catalog, Utc::now()).unwrap();
        assert!(reopened.appeal.actual_date.is_none());
        assert_eq!(reopened.appeal.status_id, f.in_progress);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let f = fixture();
        let current = appeal(f.new);
        let err = apply_transition(&current, Uuid::new_v4(), &f.catalog, Utc::now()).unwrap_err();
        assert!(matches!(err, CaseError::UnknownStatus { .. }));
    }

    #[test]
    fn catalog_lookup() {
        let f = fixture();
        assert_eq!(f.catalog.len(), 4);
        assert!(f.catalog.is_final(f.resolved));
        assert!(!f.catalog.is_final(f.new));
        assert!(!f.catalog.is_final(Uuid::new_v4()));
        assert_eq!(f.catalog.find_by_name("Rejected").map(|s| s.id), Some(f.rejected));
    }
}
