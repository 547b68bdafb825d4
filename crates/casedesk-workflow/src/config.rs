//! Workflow configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the appeal and comment workflows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Name of the catalog status every new appeal starts in (default: "New").
    pub initial_status_name: String,
    /// Root directory attachment blobs are stored under.
    pub upload_dir: PathBuf,
    /// Maximum size of a single uploaded file in bytes (default: 10 MiB).
    pub max_upload_size: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            initial_status_name: "New".into(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}
