//! Opening the casedesk database.
//!
//! The endpoint scheme picks the engine: `ws://`, `wss://`, `http://` or
//! `https://` reach a SurrealDB server and sign in as root, `mem://` opens
//! an embedded in-memory store with no credentials.

use std::time::Duration;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::error::DbError;

const REMOTE_SCHEMES: [&str; 4] = ["ws://", "wss://", "http://", "https://"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Connection attempts before giving up; at least one is made.
    pub max_retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "casedesk".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            max_retry_attempts: 5,
            retry_delay_ms: 2000,
        }
    }
}

impl DbConfig {
    pub fn is_remote(&self) -> bool {
        REMOTE_SCHEMES
            .iter()
            .any(|scheme| self.endpoint.starts_with(scheme))
    }
}

/// Handle to an open database with the namespace and database selected.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Retries while the server is unreachable, sleeping `retry_delay_ms`
    /// between attempts. Returns the last error once attempts run out.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let attempts = config.max_retry_attempts.max(1);
        let delay = Duration::from_millis(config.retry_delay_ms);
        let mut attempt = 1;
        loop {
            match Self::open(config).await {
                Ok(db) => {
                    info!(
                        endpoint = %config.endpoint,
                        namespace = %config.namespace,
                        database = %config.database,
                        attempt,
                        "Database ready"
                    );
                    return Ok(Self { db });
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        endpoint = %config.endpoint,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Database unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(DbError::from(e)),
            }
        }
    }

    async fn open(config: &DbConfig) -> Result<Surreal<Any>, surrealdb::Error> {
        let db = any::connect(config.endpoint.as_str()).await?;
        if config.is_remote() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        Ok(db)
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}
