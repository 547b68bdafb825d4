//! SurrealDB implementation of [`AppealRepository`].
//!
//! The contact block is flattened into `contact_*` columns. Mutations after
//! creation go through [`AppealRepository::persist`], which writes every
//! mutable field in one statement so readers never observe a status without
//! its matching completion stamp.

use casedesk_core::error::CaseResult;
use casedesk_core::models::appeal::{Appeal, AppealContact, AppealScope, CreateAppeal};
use casedesk_core::repository::{AppealRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const SELECT_APPEAL: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('appeal', $id)";

#[derive(Debug, SurrealValue)]
struct AppealRow {
    record_id: String,
    user_id: String,
    organization_id: String,
    status_id: String,
    responsible_user_id: Option<String>,
    subject: String,
    description: String,
    priority: String,
    contact_name: String,
    contact_surname: String,
    contact_patronymic: String,
    contact_phone: String,
    contact_email: String,
    contact_department: String,
    contact_work_position: String,
    solving: String,
    created_at: DateTime<Utc>,
    actual_date: Option<DateTime<Utc>>,
}

impl AppealRow {
    fn try_into_appeal(self) -> Result<Appeal, DbError> {
        Ok(Appeal {
            id: parse_uuid(&self.record_id, "appeal")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            status_id: parse_uuid(&self.status_id, "status")?,
            responsible_user_id: parse_opt_uuid(self.responsible_user_id, "responsible user")?,
            subject: self.subject,
            description: self.description,
            priority: self.priority,
            contact: AppealContact {
                name: self.contact_name,
                surname: self.contact_surname,
                patronymic: self.contact_patronymic,
                phone: self.contact_phone,
                email: self.contact_email,
                department: self.contact_department,
                work_position: self.contact_work_position,
            },
            solving: self.solving,
            created_at: self.created_at,
            actual_date: self.actual_date,
        })
    }
}

/// WHERE clause restricting a listing to `scope`. Both `$organization_ids`
/// and `$user_id` are always bound.
fn scope_filter(scope: &AppealScope) -> &'static str {
    match scope {
        AppealScope::All => "",
        AppealScope::Organizations(_) => "WHERE organization_id IN $organization_ids",
        AppealScope::SubmittedBy(_) => "WHERE user_id = $user_id",
    }
}

/// SurrealDB implementation of the Appeal repository.
#[derive(Clone)]
pub struct SurrealAppealRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppealRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppealRepository for SurrealAppealRepository<C> {
    async fn create(&self, input: CreateAppeal) -> CaseResult<Appeal> {
        let id_str = Uuid::new_v4().to_string();
        let draft = input.draft;
        let contact = draft.contact;

        let query = format!(
            "CREATE type::record('appeal', $id) SET \
             user_id = $user_id, organization_id = $organization_id, \
             status_id = $status_id, responsible_user_id = NONE, \
             subject = $subject, description = $description, \
             priority = $priority, \
             contact_name = $contact_name, \
             contact_surname = $contact_surname, \
             contact_patronymic = $contact_patronymic, \
             contact_phone = $contact_phone, \
             contact_email = $contact_email, \
             contact_department = $contact_department, \
             contact_work_position = $contact_work_position, \
             solving = '', actual_date = NONE; \
             {SELECT_APPEAL}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("status_id", input.status_id.to_string()))
            .bind(("subject", draft.subject))
            .bind(("description", draft.description))
            .bind(("priority", draft.priority))
            .bind(("contact_name", contact.name))
            .bind(("contact_surname", contact.surname))
            .bind(("contact_patronymic", contact.patronymic))
            .bind(("contact_phone", contact.phone))
            .bind(("contact_email", contact.email))
            .bind(("contact_department", contact.department))
            .bind(("contact_work_position", contact.work_position))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AppealRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_appeal()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Appeal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_APPEAL)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppealRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_appeal()?)
    }

    async fn persist(&self, appeal: &Appeal) -> CaseResult<Appeal> {
        let id_str = appeal.id.to_string();
        let query = format!(
            "UPDATE type::record('appeal', $id) SET \
             status_id = $status_id, actual_date = $actual_date, \
             responsible_user_id = $responsible_user_id, \
             solving = $solving, updated_at = time::now(); \
             {SELECT_APPEAL}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("status_id", appeal.status_id.to_string()))
            .bind(("actual_date", appeal.actual_date))
            .bind((
                "responsible_user_id",
                appeal.responsible_user_id.map(|u| u.to_string()),
            ))
            .bind(("solving", appeal.solving.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AppealRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appeal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_appeal()?)
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 LET $comments = (SELECT VALUE meta::id(id) FROM comment \
                     WHERE appeal_id = $id); \
                 DELETE comment_file WHERE comment_id IN $comments; \
                 DELETE comment WHERE appeal_id = $id; \
                 DELETE appeal_file WHERE appeal_id = $id; \
                 DELETE task WHERE appeal_id = $id; \
                 DELETE appeal_stop_interval WHERE appeal_id = $id; \
                 DELETE type::record('appeal', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(appeal_id = %id, "Appeal and its children deleted");
        Ok(())
    }

    async fn list(
        &self,
        scope: AppealScope,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Appeal>> {
        let filter = scope_filter(&scope);
        let (organization_ids, user_id) = match scope {
            AppealScope::All => (Vec::new(), String::new()),
            AppealScope::Organizations(ids) => {
                (ids.iter().map(Uuid::to_string).collect(), String::new())
            }
            AppealScope::SubmittedBy(user_id) => (Vec::new(), user_id.to_string()),
        };

        let query = format!(
            "SELECT count() AS total FROM appeal {filter} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM appeal {filter} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("organization_ids", organization_ids))
            .bind(("user_id", user_id))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = CountRow::total(count_rows);

        let rows: Vec<AppealRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AppealRow::try_into_appeal)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_filter_matches_scope() {
        assert_eq!(scope_filter(&AppealScope::All), "");
        assert!(scope_filter(&AppealScope::Organizations(vec![])).contains("organization_id IN"));
        assert!(scope_filter(&AppealScope::SubmittedBy(Uuid::nil())).contains("user_id ="));
    }
}
