//! Appeal service: create, read, update and delete orchestration.
//!
//! Every entry point takes the resolved [`Actor`], asks the access policy
//! before touching anything, and only then reads the catalog, writes the
//! entity store or touches blobs. Notification intents are emitted after
//! the write succeeded and their delivery failures are logged, never
//! returned.

use casedesk_core::error::CaseResult;
use casedesk_core::models::actor::Actor;
use casedesk_core::models::appeal::{Appeal, AppealChanges, AppealDraft, CreateAppeal};
use casedesk_core::models::attachment::{Attachment, AttachmentOwner};
use casedesk_core::notification::{NotificationEvent, NotificationSink};
use casedesk_core::policy::{Operation, authorize, authorize_changes, visibility};
use casedesk_core::repository::{
    AppealRepository, AppealStatusRepository, AttachmentRepository, PaginatedResult, Pagination,
};
use casedesk_core::transition::apply_transition;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::files::{FileDownload, FileUpload, fetch_file, prepare_batch, store_files};
use crate::storage::LocalFileStorage;

/// Inactive users may not do anything.
pub(crate) fn ensure_active(actor: &Actor) -> Result<(), WorkflowError> {
    if actor.is_active {
        Ok(())
    } else {
        Err(WorkflowError::InactiveActor)
    }
}

/// Hand an intent to the sink; a failing sink is logged and ignored.
pub(crate) async fn deliver<N: NotificationSink>(sink: &N, event: NotificationEvent) {
    if let Err(e) = sink.emit(&event).await {
        warn!(
            kind = event.kind(),
            appeal_id = %event.appeal_id(),
            error = %e,
            "Notification delivery failed"
        );
    }
}

/// Appeal service.
///
/// Generic over repository implementations so that the workflow layer
/// has no dependency on the database crate.
pub struct AppealService<A, S, F, N>
where
    A: AppealRepository,
    S: AppealStatusRepository,
    F: AttachmentRepository,
    N: NotificationSink,
{
    appeals: A,
    statuses: S,
    attachments: F,
    storage: LocalFileStorage,
    notifier: N,
    config: WorkflowConfig,
}

impl<A, S, F, N> AppealService<A, S, F, N>
where
    A: AppealRepository,
    S: AppealStatusRepository,
    F: AttachmentRepository,
    N: NotificationSink,
{
    pub fn new(
        appeals: A,
        statuses: S,
        attachments: F,
        notifier: N,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            appeals,
            statuses,
            attachments,
            storage: LocalFileStorage::new(config.upload_dir.clone()),
            notifier,
            config,
        }
    }

    /// File a new appeal on behalf of the actor's organization.
    pub async fn create(&self, actor: &Actor, draft: AppealDraft) -> CaseResult<Appeal> {
        ensure_active(actor)?;
        let organization_id = actor
            .represented_organization()
            .ok_or(WorkflowError::NotARepresentative)?;

        let initial = self
            .statuses
            .get_by_name(&self.config.initial_status_name)
            .await?
            .ok_or(WorkflowError::InitialStatusMissing)?;

        let appeal = self
            .appeals
            .create(CreateAppeal {
                user_id: actor.user_id,
                organization_id,
                status_id: initial.id,
                draft,
            })
            .await?;

        info!(
            appeal_id = %appeal.id,
            organization_id = %organization_id,
            user_id = %actor.user_id,
            "Appeal created"
        );

        deliver(
            &self.notifier,
            NotificationEvent::AppealCreated {
                appeal_id: appeal.id,
                organization_id,
                user_id: actor.user_id,
                timestamp: appeal.created_at,
            },
        )
        .await;

        Ok(appeal)
    }

    pub async fn get(&self, actor: &Actor, appeal_id: Uuid) -> CaseResult<Appeal> {
        self.load_authorized(actor, appeal_id, Operation::Read).await
    }

    /// Appeals visible to the actor, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Appeal>> {
        ensure_active(actor)?;
        self.appeals.list(visibility(actor), pagination).await
    }

    /// Apply `changes` as one atomic write. The status change, if any, goes
    /// through the transition rules; a `StatusChanged` intent follows only
    /// when the status actually moved.
    pub async fn update(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        changes: AppealChanges,
    ) -> CaseResult<Appeal> {
        ensure_active(actor)?;
        let appeal = self.appeals.get_by_id(appeal_id).await?;
        authorize_changes(actor, &appeal, &changes)?;

        let (mut next, event) = match changes.status_id {
            Some(status_id) => {
                let catalog = self.statuses.catalog().await?;
                let outcome = apply_transition(&appeal, status_id, &catalog, Utc::now())?;
                (outcome.appeal, outcome.event)
            }
            None => (appeal.clone(), None),
        };
        if let Some(responsible) = changes.responsible_user_id {
            next.responsible_user_id = responsible;
        }
        if let Some(solving) = changes.solving {
            next.solving = solving;
        }

        if next == appeal {
            return Ok(appeal);
        }

        let stored = self.appeals.persist(&next).await?;

        if let Some(event) = event {
            info!(
                appeal_id = %stored.id,
                old_status_id = %event.old_status_id,
                new_status_id = %event.new_status_id,
                user_id = %actor.user_id,
                "Appeal status changed"
            );
            deliver(&self.notifier, event.into()).await;
        }

        Ok(stored)
    }

    /// Delete the appeal, its comments and every attachment blob.
    pub async fn delete(&self, actor: &Actor, appeal_id: Uuid) -> CaseResult<()> {
        self.load_authorized(actor, appeal_id, Operation::Delete)
            .await?;

        for attachment in self.attachments.list_for_appeal_tree(appeal_id).await? {
            if let Err(e) = self.storage.remove(&attachment.path).await {
                warn!(path = %attachment.path, error = %e, "Failed to remove attachment blob");
            }
        }
        self.appeals.delete(appeal_id).await?;

        info!(%appeal_id, user_id = %actor.user_id, "Appeal deleted");
        Ok(())
    }

    pub async fn upload_files(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        files: Vec<FileUpload>,
    ) -> CaseResult<Vec<Attachment>> {
        self.load_authorized(actor, appeal_id, Operation::UploadFile)
            .await?;
        let files = prepare_batch(files, self.config.max_upload_size)?;

        store_files(
            &self.attachments,
            &self.storage,
            AttachmentOwner::Appeal(appeal_id),
            files,
        )
        .await
    }

    pub async fn list_files(&self, actor: &Actor, appeal_id: Uuid) -> CaseResult<Vec<Attachment>> {
        self.load_authorized(actor, appeal_id, Operation::Read)
            .await?;
        self.attachments
            .list(AttachmentOwner::Appeal(appeal_id))
            .await
    }

    pub async fn download_file(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        file_id: Uuid,
    ) -> CaseResult<FileDownload> {
        self.load_authorized(actor, appeal_id, Operation::DownloadFile)
            .await?;
        fetch_file(
            &self.attachments,
            &self.storage,
            AttachmentOwner::Appeal(appeal_id),
            file_id,
        )
        .await
    }

    /// Removing an attachment needs the same right as adding one.
    pub async fn delete_file(&self, actor: &Actor, appeal_id: Uuid, file_id: Uuid) -> CaseResult<()> {
        self.load_authorized(actor, appeal_id, Operation::UploadFile)
            .await?;

        let owner = AttachmentOwner::Appeal(appeal_id);
        let attachment = self.attachments.get(owner, file_id).await?;
        self.storage.remove(&attachment.path).await?;
        self.attachments.delete(owner, file_id).await
    }

    async fn load_authorized(
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
