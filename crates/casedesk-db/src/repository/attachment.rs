//! SurrealDB implementation of [`AttachmentRepository`].
//!
//! Appeal and comment attachments live in separate tables (`appeal_file`,
//! `comment_file`) whose owner column is selected as `owner_id`.

use casedesk_core::error::CaseResult;
use casedesk_core::models::attachment::{Attachment, AttachmentOwner};
use casedesk_core::repository::AttachmentRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AttachmentRow {
    record_id: String,
    owner_id: String,
    path: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
enum OwnerKind {
    Appeal,
    Comment,
}

impl OwnerKind {
    fn of(owner: AttachmentOwner) -> Self {
        match owner {
            AttachmentOwner::Appeal(_) => Self::Appeal,
            AttachmentOwner::Comment(_) => Self::Comment,
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Appeal => "appeal_file",
            Self::Comment => "comment_file",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Appeal => "appeal_id",
            Self::Comment => "comment_id",
        }
    }

    fn projection(self) -> String {
        format!(
            "meta::id(id) AS record_id, {} AS owner_id, path, created_at",
            self.owner_column()
        )
    }

    fn owner(self, id: Uuid) -> AttachmentOwner {
        match self {
            Self::Appeal => AttachmentOwner::Appeal(id),
            Self::Comment => AttachmentOwner::Comment(id),
        }
    }
}

impl AttachmentRow {
    fn try_into_attachment(self, kind: OwnerKind) -> Result<Attachment, DbError> {
        Ok(Attachment {
            id: parse_uuid(&self.record_id, "attachment")?,
            owner: kind.owner(parse_uuid(&self.owner_id, "attachment owner")?),
            path: self.path,
            created_at: self.created_at,
        })
    }
}

fn into_attachments(rows: Vec<AttachmentRow>, kind: OwnerKind) -> Result<Vec<Attachment>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_attachment(kind))
        .collect()
}

/// SurrealDB implementation of the Attachment repository.
#[derive(Clone)]
pub struct SurrealAttachmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAttachmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AttachmentRepository for SurrealAttachmentRepository<C> {
    async fn create(&self, owner: AttachmentOwner, path: String) -> CaseResult<Attachment> {
        let kind = OwnerKind::of(owner);
        let id_str = Uuid::new_v4().to_string();

        let query = format!(
            "CREATE type::record('{table}', $id) SET {column} = $owner_id, path = $path; \
             SELECT {projection} FROM type::record('{table}', $id)",
            table = kind.table(),
            column = kind.owner_column(),
            projection = kind.projection(),
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner.id().to_string()))
            .bind(("path", path))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AttachmentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: kind.table().into(),
            id: id_str,
        })?;

        Ok(row.try_into_attachment(kind)?)
    }

    async fn get(&self, owner: AttachmentOwner, id: Uuid) -> CaseResult<Attachment> {
        let kind = OwnerKind::of(owner);
        let id_str = id.to_string();

        let query = format!(
            "SELECT {projection} FROM type::record('{table}', $id) \
             WHERE {column} = $owner_id",
            table = kind.table(),
            column = kind.owner_column(),
            projection = kind.projection(),
        );

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner.id().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttachmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: kind.table().into(),
            id: id_str,
        })?;

        Ok(row.try_into_attachment(kind)?)
    }

    async fn list(&self, owner: AttachmentOwner) -> CaseResult<Vec<Attachment>> {
        let kind = OwnerKind::of(owner);

        let query = format!(
            "SELECT {projection} FROM {table} \
             WHERE {column} = $owner_id ORDER BY created_at ASC",
            table = kind.table(),
            column = kind.owner_column(),
            projection = kind.projection(),
        );

        let mut result = self
            .db
            .query(query)
            .bind(("owner_id", owner.id().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttachmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_attachments(rows, kind)?)
    }

    async fn list_for_appeal_tree(&self, appeal_id: Uuid) -> CaseResult<Vec<Attachment>> {
        let query = format!(
            "SELECT {appeal_projection} FROM appeal_file WHERE appeal_id = $appeal_id; \
             SELECT {comment_projection} FROM comment_file WHERE comment_id IN \
                 (SELECT VALUE meta::id(id) FROM comment WHERE appeal_id = $appeal_id)",
            appeal_projection = OwnerKind::Appeal.projection(),
            comment_projection = OwnerKind::Comment.projection(),
        );

        let mut result = self
            .db
            .query(query)
            .bind(("appeal_id", appeal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let appeal_rows: Vec<AttachmentRow> = result.take(0).map_err(DbError::from)?;
        let comment_rows: Vec<AttachmentRow> = result.take(1).map_err(DbError::from)?;

        let mut attachments = into_attachments(appeal_rows, OwnerKind::Appeal)?;
        attachments.extend(into_attachments(comment_rows, OwnerKind::Comment)?);
        Ok(attachments)
    }

    async fn delete(&self, owner: AttachmentOwner, id: Uuid) -> CaseResult<()> {
        let attachment = self.get(owner, id).await?;

        self.db
            .query(format!(
                "DELETE type::record('{}', $id)",
                OwnerKind::of(owner).table()
            ))
            .bind(("id", attachment.id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
