//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings; every foreign key is the referenced
//! record's UUID string.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "appeal_lookup_indexes",
        sql: SCHEMA_V2,
    },
    Migration {
        version: 3,
        name: "tasks_and_stop_intervals",
        sql: SCHEMA_V3,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE option<string>;
DEFINE FIELD first_name ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD last_name ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD is_staff ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_superuser ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Appeal statuses (catalog)
-- =======================================================================
DEFINE TABLE appeal_status SCHEMAFULL;
DEFINE FIELD name ON TABLE appeal_status TYPE string;
DEFINE FIELD description ON TABLE appeal_status TYPE option<string>;
DEFINE FIELD is_final ON TABLE appeal_status TYPE bool DEFAULT false;
DEFINE FIELD color ON TABLE appeal_status TYPE string \
    DEFAULT '#000000';
DEFINE INDEX idx_appeal_status_name ON TABLE appeal_status \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Organizations
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD email ON TABLE organization TYPE string DEFAULT '';
DEFINE FIELD phone ON TABLE organization TYPE string DEFAULT '';
DEFINE FIELD telegram_chat_id ON TABLE organization \
    TYPE option<string>;
DEFINE FIELD send_notifications_to_internal_chat ON TABLE organization \
    TYPE bool DEFAULT true;
DEFINE FIELD call_internal_specialists ON TABLE organization \
    TYPE bool DEFAULT true;
DEFINE FIELD custom_appeal_completion ON TABLE organization \
    TYPE bool DEFAULT false;
DEFINE FIELD custom_appeal_completion_status_id ON TABLE organization \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Representatives (one organization each, one-level hierarchy)
-- =======================================================================
DEFINE TABLE representative SCHEMAFULL;
DEFINE FIELD user_id ON TABLE representative TYPE string;
DEFINE FIELD organization_id ON TABLE representative TYPE string;
DEFINE FIELD main_representative_id ON TABLE representative \
    TYPE option<string>;
DEFINE FIELD surname ON TABLE representative TYPE string;
DEFINE FIELD name ON TABLE representative TYPE string;
DEFINE FIELD patronymic ON TABLE representative TYPE string DEFAULT '';
DEFINE FIELD email ON TABLE representative TYPE string DEFAULT '';
DEFINE FIELD phone ON TABLE representative TYPE string DEFAULT '';
DEFINE FIELD is_shared ON TABLE representative TYPE bool DEFAULT false;
DEFINE INDEX idx_representative_user ON TABLE representative \
    COLUMNS user_id UNIQUE;
DEFINE INDEX idx_representative_org ON TABLE representative \
    COLUMNS organization_id;

-- =======================================================================
-- Specialists (internal staff, controlled organizations)
-- =======================================================================
DEFINE TABLE specialist SCHEMAFULL;
DEFINE FIELD user_id ON TABLE specialist TYPE string;
DEFINE FIELD department ON TABLE specialist TYPE option<string>;
DEFINE FIELD organization_ids ON TABLE specialist TYPE array<string> \
    DEFAULT [];
DEFINE INDEX idx_specialist_user ON TABLE specialist \
    COLUMNS user_id UNIQUE;

-- =======================================================================
-- Appeals
-- =======================================================================
DEFINE TABLE appeal SCHEMAFULL;
DEFINE FIELD user_id ON TABLE appeal TYPE string;
DEFINE FIELD organization_id ON TABLE appeal TYPE string \
    READONLY;
DEFINE FIELD status_id ON TABLE appeal TYPE string;
DEFINE FIELD responsible_user_id ON TABLE appeal TYPE option<string>;
DEFINE FIELD subject ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD description ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD priority ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_name ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_surname ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_patronymic ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_phone ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_email ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_department ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD contact_work_position ON TABLE appeal TYPE string \
    DEFAULT '';
DEFINE FIELD solving ON TABLE appeal TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE appeal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE appeal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD actual_date ON TABLE appeal TYPE option<datetime>;

-- =======================================================================
-- Comments (append-only children of appeals)
-- =======================================================================
DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD appeal_id ON TABLE comment TYPE string;
DEFINE FIELD user_id ON TABLE comment TYPE string;
DEFINE FIELD text ON TABLE comment TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Attachments (relative storage paths)
-- =======================================================================
DEFINE TABLE appeal_file SCHEMAFULL;
DEFINE FIELD appeal_id ON TABLE appeal_file TYPE string;
DEFINE FIELD path ON TABLE appeal_file TYPE string;
DEFINE FIELD created_at ON TABLE appeal_file TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE comment_file SCHEMAFULL;
DEFINE FIELD comment_id ON TABLE comment_file TYPE string;
DEFINE FIELD path ON TABLE comment_file TYPE string;
DEFINE FIELD created_at ON TABLE comment_file TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Schema v2: lookup indexes for listing and cascading deletes
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE INDEX idx_appeal_org ON TABLE appeal COLUMNS organization_id;
DEFINE INDEX idx_appeal_user ON TABLE appeal COLUMNS user_id;
DEFINE INDEX idx_appeal_status ON TABLE appeal COLUMNS status_id;
DEFINE INDEX idx_comment_appeal ON TABLE comment COLUMNS appeal_id;
DEFINE INDEX idx_appeal_file_appeal ON TABLE appeal_file \
    COLUMNS appeal_id;
DEFINE INDEX idx_comment_file_comment ON TABLE comment_file \
    COLUMNS comment_id;
";

// -----------------------------------------------------------------------
// Schema v3: appeal tasks and stop intervals
// -----------------------------------------------------------------------

const SCHEMA_V3: &str = "\
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD appeal_id ON TABLE task TYPE string READONLY;
DEFINE FIELD user_id ON TABLE task TYPE string READONLY;
DEFINE FIELD gitlab_url ON TABLE task TYPE string DEFAULT '';
DEFINE FIELD status ON TABLE task TYPE string;
DEFINE FIELD description ON TABLE task TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE task TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_task_appeal ON TABLE task COLUMNS appeal_id;
DEFINE INDEX idx_task_user ON TABLE task COLUMNS user_id;

DEFINE TABLE appeal_stop_interval SCHEMAFULL;
DEFINE FIELD appeal_id ON TABLE appeal_stop_interval TYPE string READONLY;
DEFINE FIELD start_dt ON TABLE appeal_stop_interval TYPE datetime;
DEFINE FIELD end_dt ON TABLE appeal_stop_interval TYPE option<datetime>;
DEFINE FIELD description ON TABLE appeal_stop_interval \
    TYPE option<string>;
DEFINE INDEX idx_stop_interval_appeal ON TABLE appeal_stop_interval \
    COLUMNS appeal_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
