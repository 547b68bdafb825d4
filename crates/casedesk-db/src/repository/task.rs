//! SurrealDB implementation of [`TaskRepository`].

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::task::{CreateTask, TASK_FIELD_MAX_LEN, Task, UpdateTask};
use casedesk_core::repository::{PaginatedResult, Pagination, TaskRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_TASK: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('task', $id)";

#[derive(Debug, SurrealValue)]
struct TaskRow {
    record_id: String,
    appeal_id: String,
    user_id: String,
    gitlab_url: String,
    status: String,
    description: String,
}

impl TaskRow {
    fn try_into_task(self) -> Result<Task, DbError> {
        Ok(Task {
            id: parse_uuid(&self.record_id, "task")?,
            appeal_id: parse_uuid(&self.appeal_id, "appeal")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            gitlab_url: self.gitlab_url,
            status: self.status,
            description: self.description,
        })
    }
}

fn check_status(status: &str) -> CaseResult<()> {
    if status.trim().is_empty() {
        return Err(CaseError::validation("task status must not be empty"));
    }
    check_len("status", status)
}

fn check_len(field: &str, value: &str) -> CaseResult<()> {
    if value.chars().count() > TASK_FIELD_MAX_LEN {
        return Err(CaseError::validation(format!(
            "task {field} is longer than {TASK_FIELD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// SurrealDB implementation of the Task repository.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn list_where(
        &self,
        column: &'static str,
        value: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Task>> {
        let query = format!(
            "SELECT count() AS total FROM task WHERE {column} = $value GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM task WHERE {column} = $value \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<TaskRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(TaskRow::try_into_task)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: CountRow::total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn create(&self, input: CreateTask) -> CaseResult<Task> {
        check_status(&input.status)?;
        check_len("gitlab_url", &input.gitlab_url)?;

        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('task', $id) SET \
             appeal_id = $appeal_id, user_id = $user_id, \
             gitlab_url = $gitlab_url, status = $status, \
             description = $description; \
             {SELECT_TASK}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("appeal_id", input.appeal_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("gitlab_url", input.gitlab_url))
            .bind(("status", input.status))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Task> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_TASK)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }

    async fn update(&self, id: Uuid, input: UpdateTask) -> CaseResult<Task> {
        if let Some(ref status) = input.status {
            check_status(status)?;
        }
        if let Some(ref url) = input.gitlab_url {
            check_len("gitlab_url", url)?;
        }
        if input.is_empty() {
            return self.get_by_id(id).await;
        }
        self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.gitlab_url.is_some() {
            sets.push("gitlab_url = $gitlab_url");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }

        let query = format!(
            "UPDATE type::record('task', $id) SET {}; {SELECT_TASK}",
            sets.join(", ")
        );

        let id_str = id.to_string();
        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(url) = input.gitlab_url {
            builder = builder.bind(("gitlab_url", url));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('task', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_appeal(
        &self,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Task>> {
        self.list_where("appeal_id", appeal_id, pagination).await
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Task>> {
        self.list_where("user_id", user_id, pagination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_be_present_and_bounded() {
        assert!(check_status("opened").is_ok());
        assert!(check_status("  ").is_err());
        assert!(check_status(&"x".repeat(TASK_FIELD_MAX_LEN)).is_ok());
        assert!(check_status(&"x".repeat(TASK_FIELD_MAX_LEN + 1)).is_err());
    }
}
