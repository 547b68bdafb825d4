//! SurrealDB implementation of [`CommentRepository`].

use casedesk_core::error::CaseResult;
use casedesk_core::models::comment::{Comment, CreateComment};
use casedesk_core::repository::{CommentRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const SELECT_COMMENT: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('comment', $id)";

#[derive(Debug, SurrealValue)]
struct CommentRow {
    record_id: String,
    appeal_id: String,
    user_id: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        Ok(Comment {
            id: parse_uuid(&self.record_id, "comment")?,
            appeal_id: parse_uuid(&self.appeal_id, "appeal")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            text: self.text,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> CaseResult<Comment> {
        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('comment', $id) SET \
             appeal_id = $appeal_id, user_id = $user_id, text = $text; \
             {SELECT_COMMENT}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("appeal_id", input.appeal_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("text", input.text))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CommentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.try_into_comment()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Comment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_COMMENT)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.try_into_comment()?)
    }

    async fn list_by_appeal(
        &self,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Comment>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM comment \
                 WHERE appeal_id = $appeal_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM comment \
                 WHERE appeal_id = $appeal_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("appeal_id", appeal_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = CountRow::total(count_rows);

        let rows: Vec<CommentRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(CommentRow::try_into_comment)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE comment_file WHERE comment_id = $id; \
                 DELETE type::record('comment', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(comment_id = %id, "Comment deleted");
        Ok(())
    }
}
