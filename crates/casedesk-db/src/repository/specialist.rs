//! SurrealDB implementation of [`SpecialistRepository`].

use std::collections::BTreeSet;

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::specialist::{CreateSpecialist, Specialist};
use casedesk_core::repository::{PaginatedResult, Pagination, SpecialistRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_SPECIALIST: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('specialist', $id)";

#[derive(Debug, SurrealValue)]
struct SpecialistRow {
    record_id: String,
    user_id: String,
    department: Option<String>,
    organization_ids: Vec<String>,
}

impl SpecialistRow {
    fn try_into_specialist(self) -> Result<Specialist, DbError> {
        let organization_ids = self
            .organization_ids
            .iter()
            .map(|raw| parse_uuid(raw, "organization"))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Specialist {
            id: parse_uuid(&self.record_id, "specialist")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            department: self.department,
            organization_ids,
        })
    }
}

/// SurrealDB implementation of the Specialist repository.
#[derive(Clone)]
pub struct SurrealSpecialistRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSpecialistRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a single-record statement followed by a re-select, returning the
    /// fresh row.
    async fn mutate(&self, id: Uuid, statement: &str, organization_id: Uuid) -> CaseResult<Specialist> {
        let id_str = id.to_string();
        let query = format!("{statement}; {SELECT_SPECIALIST}");

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SpecialistRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "specialist".into(),
            id: id_str,
        })?;

        Ok(row.try_into_specialist()?)
    }
}

impl<C: Connection> SpecialistRepository for SurrealSpecialistRepository<C> {
    async fn create(&self, input: CreateSpecialist) -> CaseResult<Specialist> {
        let user_id_str = input.user_id.to_string();

        let mut checks = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE meta::id(id) = $user_id GROUP ALL; \
                 SELECT count() AS total FROM specialist \
                 WHERE user_id = $user_id GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let users: Vec<CountRow> = checks.take(0).map_err(DbError::from)?;
        let specialists: Vec<CountRow> = checks.take(1).map_err(DbError::from)?;
        if CountRow::total(users) == 0 {
            return Err(CaseError::validation("user not found"));
        }
        if CountRow::total(specialists) > 0 {
            return Err(CaseError::AlreadyExists {
                entity: "specialist".into(),
            });
        }

        let id_str = Uuid::new_v4().to_string();
        let organization_ids: Vec<String> = input
            .organization_ids
            .iter()
            .map(Uuid::to_string)
            .collect();

        let query = format!(
            "CREATE type::record('specialist', $id) SET \
             user_id = $user_id, department = $department, \
             organization_ids = $organization_ids; \
             {SELECT_SPECIALIST}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", user_id_str))
            .bind(("department", input.department))
            .bind(("organization_ids", organization_ids))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SpecialistRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "specialist".into(),
            id: id_str,
        })?;

        Ok(row.try_into_specialist()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Specialist> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_SPECIALIST)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpecialistRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "specialist".into(),
            id: id_str,
        })?;

        Ok(row.try_into_specialist()?)
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> CaseResult<Option<Specialist>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM specialist \
                 WHERE user_id = $user_id",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpecialistRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(SpecialistRow::try_into_specialist)
            .transpose()?)
    }

    async fn add_organization(&self, id: Uuid, organization_id: Uuid) -> CaseResult<Specialist> {
        self.mutate(
            id,
            "UPDATE type::record('specialist', $id) SET \
             organization_ids = array::union(organization_ids, [$organization_id])",
            organization_id,
        )
        .await
    }

    async fn remove_organization(&self, id: Uuid, organization_id: Uuid) -> CaseResult<Specialist> {
        self.mutate(
            id,
            "UPDATE type::record('specialist', $id) SET \
             organization_ids = array::complement(organization_ids, [$organization_id])",
            organization_id,
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('specialist', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> CaseResult<PaginatedResult<Specialist>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM specialist GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = CountRow::total(count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM specialist \
                 ORDER BY user_id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpecialistRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(SpecialistRow::try_into_specialist)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
