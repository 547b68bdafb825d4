//! Comment service.

use casedesk_core::error::CaseResult;
use casedesk_core::models::actor::Actor;
use casedesk_core::models::appeal::Appeal;
use casedesk_core::models::attachment::{Attachment, AttachmentOwner};
use casedesk_core::models::comment::{Comment, CreateComment};
use casedesk_core::policy::{Operation, authorize};
use casedesk_core::repository::{
    AppealRepository, AttachmentRepository, CommentRepository, PaginatedResult, Pagination,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::appeal::ensure_active;
use crate::config::WorkflowConfig;
use crate::files::{FileDownload, FileUpload, fetch_file, prepare_batch, store_files};
use crate::storage::LocalFileStorage;

/// A new comment together with the files attached to it.
#[derive(Debug, Clone)]
pub struct CommentWithFiles {
    pub comment: Comment,
    pub files: Vec<Attachment>,
}

/// Comments are authorized against their parent appeal.
pub struct CommentService<A, C, F>
where
    A: AppealRepository,
    C: CommentRepository,
    F: AttachmentRepository,
{
    appeals: A,
    comments: C,
    attachments: F,
    storage: LocalFileStorage,
    config: WorkflowConfig,
}

impl<A, C, F> CommentService<A, C, F>
where
    A: AppealRepository,
    C: CommentRepository,
    F: AttachmentRepository,
{
    pub fn new(appeals: A, comments: C, attachments: F, config: WorkflowConfig) -> Self {
        Self {
            appeals,
            comments,
            attachments,
            storage: LocalFileStorage::new(config.upload_dir.clone()),
            config,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        text: String,
        files: Vec<FileUpload>,
    ) -> CaseResult<CommentWithFiles> {
        let appeal = self.parent(actor, appeal_id, Operation::Comment).await?;
        let files = prepare_batch(files, self.config.max_upload_size)?;

        let comment = self
            .comments
            .create(CreateComment {
                appeal_id: appeal.id,
                user_id: actor.user_id,
                text,
            })
            .await?;

        let files = match store_files(
            &self.attachments,
            &self.storage,
            AttachmentOwner::Comment(comment.id),
            files,
        )
        .await
        {
            Ok(files) => files,
            Err(e) => {
                // A comment is only kept together with all of its files.
                if let Err(cleanup) = self.comments.delete(comment.id).await {
                    warn!(comment_id = %comment.id, error = %cleanup, "Failed to discard comment");
                }
                return Err(e);
            }
        };

        info!(
            comment_id = %comment.id,
            %appeal_id,
            user_id = %actor.user_id,
            files = files.len(),
            "Comment added"
        );
        Ok(CommentWithFiles { comment, files })
    }

    /// Comments of an appeal, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Comment>> {
        self.parent(actor, appeal_id, Operation::Read).await?;
        self.comments.list_by_appeal(appeal_id, pagination).await
    }

    pub async fn get(&self, actor: &Actor, comment_id: Uuid) -> CaseResult<Comment> {
        let comment = self.comments.get_by_id(comment_id).await?;
        self.parent(actor, comment.appeal_id, Operation::Read)
            .await?;
        Ok(comment)
    }

    pub async fn list_files(&self, actor: &Actor, comment_id: Uuid) -> CaseResult<Vec<Attachment>> {
        let comment = self.get(actor, comment_id).await?;
        self.attachments
            .list(AttachmentOwner::Comment(comment.id))
            .await
    }

    pub async fn download_file(
        &self,
        actor: &Actor,
        comment_id: Uuid,
        file_id: Uuid,
    ) -> CaseResult<FileDownload> {
        let comment = self.comments.get_by_id(comment_id).await?;
        self.parent(actor, comment.appeal_id, Operation::DownloadFile)
            .await?;
        fetch_file(
            &self.attachments,
            &self.storage,
            AttachmentOwner::Comment(comment.id),
            file_id,
        )
        .await
    }

    async fn parent(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        operation: Operation,
    ) -> CaseResult<Appeal> {
        ensure_active(actor)?;
        let appeal = self.appeals.get_by_id(appeal_id).await?;
        authorize(actor, &appeal, operation)?;
        Ok(appeal)
    }
}
