//! File attachments of appeals and comments.
//!
//! Only the relative storage path is tracked here; bytes live in the
//! file store under `"{folder}/{entity_id}/{original_filename}"`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentOwner {
    Appeal(Uuid),
    Comment(Uuid),
}

impl AttachmentOwner {
    /// Top-level storage folder for this kind of owner.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Appeal(_) => "appeal",
            Self::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Appeal(id) | Self::Comment(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub owner: AttachmentOwner,
    /// Relative path under the upload root.
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Original file name, i.e. the last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Public URL the web layer serves this file under.
    pub fn public_url(&self) -> String {
        format!("/uploads/{}", self.path)
    }
}

/// Relative storage path for a file owned by `owner`.
pub fn storage_path(owner: AttachmentOwner, file_name: &str) -> String {
    format!("{}/{}/{}", owner.folder(), owner.id(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_path_layout() {
        let id = Uuid::new_v4();
        let path = storage_path(AttachmentOwner::Comment(id), "scan.pdf");
        assert_eq!(path, format!("comment/{id}/scan.pdf"));
    }

    #[test]
    fn file_name_is_last_segment() {
        let id = Uuid::new_v4();
        let attachment = Attachment {
            id: Uuid::new_v4(),
            owner: AttachmentOwner::Appeal(id),
            path: storage_path(AttachmentOwner::Appeal(id), "report.xlsx"),
            created_at: Utc::now(),
        };
        assert_eq!(attachment.file_name(), "report.xlsx");
        assert_eq!(attachment.public_url(), format!("/uploads/appeal/{id}/report.xlsx"));
    }
}
