//! Server configuration, read from `CASEDESK_*` environment variables.
//!
//! Nested sections use a double underscore, e.g. `CASEDESK_DB__ENDPOINT` or
//! `CASEDESK_WORKFLOW__MAX_UPLOAD_SIZE`.

use casedesk_db::DbConfig;
use casedesk_workflow::WorkflowConfig;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Capacity of the notification intent channel.
    pub notification_buffer: usize,
    /// Optional pepper for password hashing.
    pub password_pepper: Option<String>,
    /// Superuser created on first start if no user has this email.
    pub first_superuser: Option<FirstSuperuser>,
    pub db: DbConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirstSuperuser {
    pub email: String,
    pub password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            notification_buffer: 256,
            password_pepper: None,
            first_superuser: None,
            db: DbConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("CASEDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
