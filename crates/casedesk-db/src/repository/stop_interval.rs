//! SurrealDB implementation of [`StopIntervalRepository`].

use casedesk_core::error::CaseResult;
use casedesk_core::models::stop_interval::{
    CreateStopInterval, StopInterval, UpdateStopInterval, check_bounds,
};
use casedesk_core::repository::StopIntervalRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

const SELECT_INTERVAL: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('appeal_stop_interval', $id)";

#[derive(Debug, SurrealValue)]
struct StopIntervalRow {
    record_id: String,
    appeal_id: String,
    start_dt: DateTime<Utc>,
    end_dt: Option<DateTime<Utc>>,
    description: Option<String>,
}

impl StopIntervalRow {
    fn try_into_interval(self) -> Result<StopInterval, DbError> {
        Ok(StopInterval {
            id: parse_uuid(&self.record_id, "stop interval")?,
            appeal_id: parse_uuid(&self.appeal_id, "appeal")?,
            start_dt: self.start_dt,
            end_dt: self.end_dt,
            description: self.description,
        })
    }
}

fn into_intervals(rows: Vec<StopIntervalRow>) -> Result<Vec<StopInterval>, DbError> {
    rows.into_iter()
        .map(StopIntervalRow::try_into_interval)
        .collect()
}

/// SurrealDB implementation of the stop interval repository.
#[derive(Clone)]
pub struct SurrealStopIntervalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStopIntervalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Write `start_dt`, `end_dt` and `description` of `id` and re-read it.
    async fn write(
        &self,
        statement: &str,
        id: String,
        appeal_id: Option<Uuid>,
        start_dt: DateTime<Utc>,
        end_dt: Option<DateTime<Utc>>,
        description: Option<String>,
    ) -> CaseResult<StopInterval> {
        let query = format!("{statement}; {SELECT_INTERVAL}");
        let result = self
            .db
            .query(query)
            .bind(("id", id.clone()))
            .bind(("appeal_id", appeal_id.map(|a| a.to_string())))
            .bind(("start_dt", start_dt))
            .bind(("end_dt", end_dt))
            .bind(("description", description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<StopIntervalRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal_stop_interval".into(),
            id,
        })?;

        Ok(row.try_into_interval()?)
    }
}

impl<C: Connection> StopIntervalRepository for SurrealStopIntervalRepository<C> {
    async fn create(&self, input: CreateStopInterval) -> CaseResult<StopInterval> {
        check_bounds(input.start_dt, input.end_dt)?;

        self.write(
            "CREATE type::record('appeal_stop_interval', $id) SET \
             appeal_id = $appeal_id, start_dt = $start_dt, \
             end_dt = $end_dt, description = $description",
            Uuid::new_v4().to_string(),
            Some(input.appeal_id),
            input.start_dt,
            input.end_dt,
            input.description,
        )
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<StopInterval> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_INTERVAL)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StopIntervalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal_stop_interval".into(),
            id: id_str,
        })?;

        Ok(row.try_into_interval()?)
    }

    async fn update(&self, id: Uuid, input: UpdateStopInterval) -> CaseResult<StopInterval> {
        let current = self.get_by_id(id).await?;
        let start_dt = input.start_dt.unwrap_or(current.start_dt);
        let end_dt = input.end_dt.unwrap_or(current.end_dt);
        let description = input.description.unwrap_or(current.description);
        check_bounds(start_dt, end_dt)?;

        self.write(
            "UPDATE type::record('appeal_stop_interval', $id) SET \
             start_dt = $start_dt, end_dt = $end_dt, description = $description",
            id.to_string(),
            None,
            start_dt,
            end_dt,
            description,
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('appeal_stop_interval', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_appeal(&self, appeal_id: Uuid) -> CaseResult<Vec<StopInterval>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appeal_stop_interval \
                 WHERE appeal_id = $appeal_id ORDER BY start_dt ASC",
            )
            .bind(("appeal_id", appeal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StopIntervalRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_intervals(rows)?)
    }

    async fn list_active(&self, at: DateTime<Utc>) -> CaseResult<Vec<StopInterval>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appeal_stop_interval \
                 WHERE start_dt <= $at AND (end_dt IS NONE OR end_dt >= $at) \
                 ORDER BY start_dt ASC",
            )
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StopIntervalRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_intervals(rows)?)
    }
}
