//! Appeal stop interval domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CaseError, CaseResult};

/// A period during which processing of an appeal is suspended. An
/// interval without `end_dt` is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopInterval {
    pub id: Uuid,
    pub appeal_id: Uuid,
    pub start_dt: DateTime<Utc>,
    pub end_dt: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl StopInterval {
    /// Length of a closed interval; a running one counts as zero.
    pub fn duration(&self) -> Duration {
        self.end_dt
            .map(|end| end - self.start_dt)
            .unwrap_or_else(Duration::zero)
    }

    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_dt <= at && self.end_dt.is_none_or(|end| end >= at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStopInterval {
    pub appeal_id: Uuid,
    pub start_dt: DateTime<Utc>,
    pub end_dt: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStopInterval {
    pub start_dt: Option<DateTime<Utc>>,
    /// `Some(None)` reopens the interval.
    pub end_dt: Option<Option<DateTime<Utc>>>,
    pub description: Option<Option<String>>,
}

/// A closed interval must end after it starts.
pub fn check_bounds(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> CaseResult<()> {
    match end {
        Some(end) if start >= end => Err(CaseError::validation(
            "start date must be before end date",
        )),
        _ => Ok(()),
    }
}
