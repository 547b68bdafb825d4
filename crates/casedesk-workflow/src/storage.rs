//! Local filesystem store for attachment blobs.
//!
//! Blobs live at `{root}/{folder}/{entity_id}/{file_name}`; only the part
//! below the root is handed back to callers and persisted.

use std::path::{Component, Path, PathBuf};

use casedesk_core::models::attachment::{AttachmentOwner, storage_path};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::WorkflowError;

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` for `owner` and return the relative storage path.
    /// An existing blob with the same name is overwritten.
    pub async fn save(
        &self,
        owner: AttachmentOwner,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, WorkflowError> {
        validate_file_name(file_name)?;

        let relative = storage_path(owner, file_name);
        let full = self.resolve(&relative)?;
        if let Some(dir) = full.parent() {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&full, bytes).await?;

        debug!(path = %relative, size = bytes.len(), "Stored attachment blob");
        Ok(relative)
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, WorkflowError> {
        let full = self.resolve(relative)?;
        Ok(fs::read(full).await?)
    }

    /// Delete a blob. A blob that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), WorkflowError> {
        let full = self.resolve(relative)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %relative, "Attachment blob already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, WorkflowError> {
        let path = Path::new(relative);
        let contained = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(WorkflowError::PathEscapesRoot(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

pub(crate) fn validate_file_name(name: &str) -> Result<(), WorkflowError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        Err(WorkflowError::InvalidFileName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn save_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let owner = AttachmentOwner::Appeal(Uuid::new_v4());

        let path = storage.save(owner, "notes.txt", b"hello").await.unwrap();
        assert_eq!(path, format!("appeal/{}/notes.txt", owner.id()));
        assert!(dir.path().join(&path).exists());
        assert_eq!(storage.read(&path).await.unwrap(), b"hello");

        storage.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        // Second removal is a no-op.
        storage.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_bad_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let owner = AttachmentOwner::Comment(Uuid::new_v4());

        for name in ["", ".", "..", "../etc/passwd", "a/b.txt", "a\\b.txt"] {
            let err = storage.save(owner, name, b"x").await.unwrap_err();
            assert!(
                matches!(err, WorkflowError::InvalidFileName(_)),
                "{name:?} accepted"
            );
        }
    }

    #[tokio::test]
    async fn rejects_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        for path in ["../secret", "/etc/passwd", "appeal/../../x", ""] {
            assert!(matches!(
                storage.read(path).await.unwrap_err(),
                WorkflowError::PathEscapesRoot(_)
            ));
            assert!(matches!(
                storage.remove(path).await.unwrap_err(),
                WorkflowError::PathEscapesRoot(_)
            ));
        }
    }

    #[tokio::test]
    async fn missing_blob_read_is_io_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        match storage.read("appeal/x/missing.bin").await.unwrap_err() {
            WorkflowError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
