//! SurrealDB implementation of [`OrganizationRepository`].

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use casedesk_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const SELECT_ORGANIZATION: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id)";

#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    record_id: String,
    name: String,
    email: String,
    phone: String,
    telegram_chat_id: Option<String>,
    send_notifications_to_internal_chat: bool,
    call_internal_specialists: bool,
    custom_appeal_completion: bool,
    custom_appeal_completion_status_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        Ok(Organization {
            id: parse_uuid(&self.record_id, "organization")?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            telegram_chat_id: self.telegram_chat_id,
            send_notifications_to_internal_chat: self.send_notifications_to_internal_chat,
            call_internal_specialists: self.call_internal_specialists,
            custom_appeal_completion: self.custom_appeal_completion,
            custom_appeal_completion_status_id: parse_opt_uuid(
                self.custom_appeal_completion_status_id,
                "completion status",
            )?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Resolve the completion status to store: cleared unless custom
    /// completion is enabled, and otherwise required to exist.
    async fn completion_status(
        &self,
        custom_completion: bool,
        status_id: Option<Uuid>,
    ) -> CaseResult<Option<String>> {
        let Some(status_id) = status_id.filter(|_| custom_completion) else {
            return Ok(None);
        };

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM appeal_status \
                 WHERE meta::id(id) = $status_id GROUP ALL",
            )
            .bind(("status_id", status_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        if CountRow::total(rows) == 0 {
            return Err(CaseError::UnknownStatus {
                id: status_id.to_string(),
            });
        }

        Ok(Some(status_id.to_string()))
    }

    async fn count_references(&self, id: &str) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM representative \
                 WHERE organization_id = $id GROUP ALL; \
                 SELECT count() AS total FROM appeal \
                 WHERE organization_id = $id GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .await?;
        let representatives: Vec<CountRow> = result.take(0)?;
        let appeals: Vec<CountRow> = result.take(1)?;
        Ok(CountRow::total(representatives) + CountRow::total(appeals))
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> CaseResult<Organization> {
        let id_str = Uuid::new_v4().to_string();
        let status_id = self
            .completion_status(
                input.custom_appeal_completion,
                input.custom_appeal_completion_status_id,
            )
            .await?;

        let query = format!(
            "CREATE type::record('organization', $id) SET \
             name = $name, email = $email, phone = $phone, \
             telegram_chat_id = $telegram_chat_id, \
             send_notifications_to_internal_chat = $send_internal, \
             call_internal_specialists = $call_specialists, \
             custom_appeal_completion = $custom_completion, \
             custom_appeal_completion_status_id = $status_id; \
             {SELECT_ORGANIZATION}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("telegram_chat_id", input.telegram_chat_id))
            .bind(("send_internal", input.send_notifications_to_internal_chat))
            .bind(("call_specialists", input.call_internal_specialists))
            .bind(("custom_completion", input.custom_appeal_completion))
            .bind(("status_id", status_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_ORGANIZATION)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> CaseResult<Organization> {
        let current = self.get_by_id(id).await?;

        let custom_completion = input
            .custom_appeal_completion
            .unwrap_or(current.custom_appeal_completion);
        let requested_status = input
            .custom_appeal_completion_status_id
            .unwrap_or(current.custom_appeal_completion_status_id);
        let status_id = self
            .completion_status(custom_completion, requested_status)
            .await?;

        let query = format!(
            "UPDATE type::record('organization', $id) SET \
             name = $name, email = $email, phone = $phone, \
             telegram_chat_id = $telegram_chat_id, \
             send_notifications_to_internal_chat = $send_internal, \
             call_internal_specialists = $call_specialists, \
             custom_appeal_completion = $custom_completion, \
             custom_appeal_completion_status_id = $status_id, \
             updated_at = time::now(); \
             {SELECT_ORGANIZATION}"
        );

        let id_str = id.to_string();
        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name.unwrap_or(current.name)))
            .bind(("email", input.email.unwrap_or(current.email)))
            .bind(("phone", input.phone.unwrap_or(current.phone)))
            .bind((
                "telegram_chat_id",
                input.telegram_chat_id.unwrap_or(current.telegram_chat_id),
            ))
            .bind((
                "send_internal",
                input
                    .send_notifications_to_internal_chat
                    .unwrap_or(current.send_notifications_to_internal_chat),
            ))
            .bind((
                "call_specialists",
                input
                    .call_internal_specialists
                    .unwrap_or(current.call_internal_specialists),
            ))
            .bind(("custom_completion", custom_completion))
            .bind(("status_id", status_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        let id_str = id.to_string();
        if self.count_references(&id_str).await? > 0 {
            return Err(CaseError::Conflict {
                reason: "organization still has representatives or appeals".into(),
            });
        }

        self.db
            .query("DELETE type::record('organization', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> CaseResult<PaginatedResult<Organization>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM organization GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = CountRow::total(count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(OrganizationRow::try_into_organization)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
