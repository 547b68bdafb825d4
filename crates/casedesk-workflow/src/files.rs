//! Attachment upload and download shared by appeals and comments.

use casedesk_core::error::CaseResult;
use casedesk_core::models::attachment::{Attachment, AttachmentOwner};
use casedesk_core::repository::AttachmentRepository;
use tracing::warn;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::storage::{LocalFileStorage, validate_file_name};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A stored file handed back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Check a whole batch before anything is written. Every file must fit
/// within `limit` bytes and carry a storable name. Files sharing a name
/// collapse into the last one, which is what storing them in order would
/// leave on disk.
pub(crate) fn prepare_batch(
    files: Vec<FileUpload>,
    limit: u64,
) -> Result<Vec<FileUpload>, WorkflowError> {
    let mut batch: Vec<FileUpload> = Vec::with_capacity(files.len());
    for file in files {
        validate_file_name(&file.file_name)?;
        let size = file.bytes.len() as u64;
        if size > limit {
            return Err(WorkflowError::FileTooLarge {
                name: file.file_name,
                size,
                limit,
            });
        }
        match batch.iter_mut().find(|f| f.file_name == file.file_name) {
            Some(earlier) => *earlier = file,
            None => batch.push(file),
        }
    }
    Ok(batch)
}

/// Write each blob and record it. Re-uploading a name the owner already
/// has replaces the blob and keeps the existing record.
///
/// On failure the records and blobs created by this call are removed
/// again. Blobs that overwrote an existing record's content stay
/// overwritten.
pub(crate) async fn store_files<F: AttachmentRepository>(
    attachments: &F,
    storage: &LocalFileStorage,
    owner: AttachmentOwner,
    files: Vec<FileUpload>,
) -> CaseResult<Vec<Attachment>> {
    let existing = attachments.list(owner).await?;
    let mut stored = Vec::with_capacity(files.len());
    let mut created = Vec::new();

    for file in files {
        match store_one(attachments, storage, owner, &existing, file).await {
            Ok((attachment, is_new)) => {
                if is_new {
                    created.push(attachment.clone());
                }
                stored.push(attachment);
            }
            Err(e) => {
                discard_files(attachments, storage, &created).await;
                return Err(e);
            }
        }
    }

    Ok(stored)
}

async fn store_one<F: AttachmentRepository>(
    attachments: &F,
    storage: &LocalFileStorage,
    owner: AttachmentOwner,
    existing: &[Attachment],
    file: FileUpload,
) -> CaseResult<(Attachment, bool)> {
    let path = storage.save(owner, &file.file_name, &file.bytes).await?;

    if let Some(current) = existing.iter().find(|a| a.path == path) {
        return Ok((current.clone(), false));
    }

    match attachments.create(owner, path.clone()).await {
        Ok(attachment) => Ok((attachment, true)),
        Err(e) => {
            if let Err(cleanup) = storage.remove(&path).await {
                warn!(%path, error = %cleanup, "Failed to remove orphaned blob");
            }
            Err(e)
        }
    }
}

/// Best-effort removal of attachments together with their blobs.
async fn discard_files<F: AttachmentRepository>(
    attachments: &F,
    storage: &LocalFileStorage,
    files: &[Attachment],
) {
    for attachment in files {
        if let Err(e) = attachments.delete(attachment.owner, attachment.id).await {
            warn!(attachment_id = %attachment.id, error = %e, "Failed to remove attachment record");
        }
        if let Err(e) = storage.remove(&attachment.path).await {
            warn!(path = %attachment.path, error = %e, "Failed to remove attachment blob");
        }
    }
}

pub(crate) async fn fetch_file<F: AttachmentRepository>(
    attachments: &F,
    storage: &LocalFileStorage,
    owner: AttachmentOwner,
    file_id: Uuid,
) -> CaseResult<FileDownload> {
    let attachment = attachments.get(owner, file_id).await?;
    let bytes = storage.read(&attachment.path).await?;
    Ok(FileDownload {
        file_name: attachment.file_name().to_string(),
        bytes,
    })
}
