//! Stop interval service.
//!
//! Suspending an appeal is an administrative act: only superusers record,
//! edit or remove intervals. Anyone who may read the appeal may see them.

use casedesk_core::error::CaseResult;
use casedesk_core::models::actor::Actor;
use casedesk_core::models::stop_interval::{
    CreateStopInterval, StopInterval, UpdateStopInterval,
};
use casedesk_core::policy::{Operation, authorize, require_superuser};
use casedesk_core::repository::{AppealRepository, StopIntervalRepository};
use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::appeal::ensure_active;

pub struct StopIntervalService<A, I>
where
    A: AppealRepository,
    I: StopIntervalRepository,
{
    appeals: A,
    intervals: I,
}

impl<A, I> StopIntervalService<A, I>
where
    A: AppealRepository,
    I: StopIntervalRepository,
{
    pub fn new(appeals: A, intervals: I) -> Self {
        Self { appeals, intervals }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateStopInterval,
    ) -> CaseResult<StopInterval> {
        ensure_active(actor)?;
        require_superuser(actor)?;
        self.appeals.get_by_id(input.appeal_id).await?;
        let interval = self.intervals.create(input).await?;
        info!(
            interval_id = %interval.id,
            appeal_id = %interval.appeal_id,
            open = interval.end_dt.is_none(),
            "Appeal stopped"
        );
        Ok(interval)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateStopInterval,
    ) -> CaseResult<StopInterval> {
        ensure_active(actor)?;
        require_superuser(actor)?;
        let interval = self.intervals.update(id, changes).await?;
        info!(interval_id = %id, appeal_id = %interval.appeal_id, "Stop interval updated");
        Ok(interval)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> CaseResult<()> {
        ensure_active(actor)?;
        require_superuser(actor)?;
        self.intervals.delete(id).await?;
        info!(interval_id = %id, "Stop interval deleted");
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> CaseResult<StopInterval> {
        let interval = self.intervals.get_by_id(id).await?;
        self.readable(actor, interval.appeal_id).await?;
        Ok(interval)
    }

    pub async fn list_for_appeal(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
    ) -> CaseResult<Vec<StopInterval>> {
        self.readable(actor, appeal_id).await?;
        self.intervals.list_by_appeal(appeal_id).await
    }

    /// Sum of the closed intervals of an appeal.
    pub async fn total_pause(&self, actor: &Actor, appeal_id: Uuid) -> CaseResult<Duration> {
        let intervals = self.list_for_appeal(actor, appeal_id).await?;
        Ok(intervals
            .iter()
            .fold(Duration::zero(), |total, i| total + i.duration()))
    }

    /// Intervals covering `at`, limited to appeals the actor may read.
    pub async fn active(&self, actor: &Actor, at: DateTime<Utc>) -> CaseResult<Vec<StopInterval>> {
        ensure_active(actor)?;
        let mut visible = Vec::new();
        for interval in self.intervals.list_active(at).await? {
            let appeal = self.appeals.get_by_id(interval.appeal_id).await?;
            if authorize(actor, &appeal, Operation::Read).is_ok() {
                visible.push(interval);
            }
        }
        Ok(visible)
    }

    async fn readable(&self, actor: &Actor, appeal_id: Uuid) -> CaseResult<()> {
        ensure_active(actor)?;
        let appeal = self.appeals.get_by_id(appeal_id).await?;
        authorize(actor, &appeal, Operation::Read)
    }
}
