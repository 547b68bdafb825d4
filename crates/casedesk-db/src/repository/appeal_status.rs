//! SurrealDB implementation of [`AppealStatusRepository`].

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::appeal_status::{
    AppealStatus, CreateAppealStatus, DEFAULT_STATUS_COLOR, UpdateAppealStatus, is_valid_color,
};
use casedesk_core::repository::{AppealStatusRepository, PaginatedResult, Pagination};
use casedesk_core::transition::StatusCatalog;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_STATUS: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('appeal_status', $id)";

#[derive(Debug, SurrealValue)]
struct AppealStatusRow {
    record_id: String,
    name: String,
    description: Option<String>,
    is_final: bool,
    color: String,
}

impl AppealStatusRow {
    fn try_into_status(self) -> Result<AppealStatus, DbError> {
        Ok(AppealStatus {
            id: parse_uuid(&self.record_id, "appeal status")?,
            name: self.name,
            description: self.description,
            is_final: self.is_final,
            color: self.color,
        })
    }
}

fn check_color(color: &str) -> CaseResult<()> {
    if is_valid_color(color) {
        Ok(())
    } else {
        Err(CaseError::validation(format!(
            "color must be a #RRGGBB hex code, got {color:?}"
        )))
    }
}

/// SurrealDB implementation of the appeal status catalog.
#[derive(Clone)]
pub struct SurrealAppealStatusRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppealStatusRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM appeal_status \
                 WHERE name = $name AND meta::id(id) != $except GROUP ALL",
            )
            .bind(("name", name.to_string()))
            .bind(("except", except.map(|u| u.to_string()).unwrap_or_default()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(CountRow::total(rows) > 0)
    }

    async fn appeals_using(&self, id: Uuid) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM appeal WHERE status_id = $id GROUP ALL")
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(CountRow::total(rows))
    }

    async fn fetch_all(&self) -> Result<Vec<AppealStatus>, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM appeal_status ORDER BY name ASC")
            .await?;
        let rows: Vec<AppealStatusRow> = result.take(0)?;
        rows.into_iter()
            .map(AppealStatusRow::try_into_status)
            .collect()
    }
}

impl<C: Connection> AppealStatusRepository for SurrealAppealStatusRepository<C> {
    async fn create(&self, input: CreateAppealStatus) -> CaseResult<AppealStatus> {
        let color = input
            .color
            .unwrap_or_else(|| DEFAULT_STATUS_COLOR.to_string());
        check_color(&color)?;

        if self.name_taken(&input.name, None).await? {
            return Err(CaseError::AlreadyExists {
                entity: "appeal_status".into(),
            });
        }

        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('appeal_status', $id) SET \
             name = $name, description = $description, \
             is_final = $is_final, color = $color; \
             {SELECT_STATUS}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("is_final", input.is_final))
            .bind(("color", color))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AppealStatusRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal_status".into(),
            id: id_str,
        })?;

        Ok(row.try_into_status()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<AppealStatus> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_STATUS)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppealStatusRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal_status".into(),
            id: id_str,
        })?;

        Ok(row.try_into_status()?)
    }

    async fn get_by_name(&self, name: &str) -> CaseResult<Option<AppealStatus>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appeal_status \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppealStatusRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(AppealStatusRow::try_into_status)
            .transpose()?)
    }

    async fn update(&self, id: Uuid, input: UpdateAppealStatus) -> CaseResult<AppealStatus> {
        if let Some(ref color) = input.color {
            check_color(color)?;
        }
        if let Some(ref name) = input.name
            && self.name_taken(name, Some(id)).await?
        {
            return Err(CaseError::AlreadyExists {
                entity: "appeal_status".into(),
            });
        }
        // Appeals in this status carry (or lack) a completion stamp that
        // matches the current flag.
        if let Some(is_final) = input.is_final
            && self.get_by_id(id).await?.is_final != is_final
            && self.appeals_using(id).await? > 0
        {
            return Err(CaseError::Conflict {
                reason: "final flag of an appeal status in use cannot change".into(),
            });
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.is_final.is_some() {
            sets.push("is_final = $is_final");
        }
        if input.color.is_some() {
            sets.push("color = $color");
        }
        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('appeal_status', $id) SET {}; {SELECT_STATUS}",
            sets.join(", ")
        );

        let id_str = id.to_string();
        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(is_final) = input.is_final {
            builder = builder.bind(("is_final", is_final));
        }
        if let Some(color) = input.color {
            builder = builder.bind(("color", color));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AppealStatusRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal_status".into(),
            id: id_str,
        })?;

        Ok(row.try_into_status()?)
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM organization \
                 WHERE custom_appeal_completion_status_id = $id GROUP ALL",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let organizations: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        if self.appeals_using(id).await? + CountRow::total(organizations) > 0 {
            return Err(CaseError::Conflict {
                reason: "appeal status is still in use".into(),
            });
        }

        self.db
            .query("DELETE type::record('appeal_status', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> CaseResult<PaginatedResult<AppealStatus>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM appeal_status GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = CountRow::total(count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appeal_status \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppealStatusRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AppealStatusRow::try_into_status)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn catalog(&self) -> CaseResult<StatusCatalog> {
        Ok(self.fetch_all().await?.into_iter().collect())
    }
}
