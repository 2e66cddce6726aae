//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

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

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "profiles_and_brands",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Profiles (record key = identity id, which makes it unique)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD email ON TABLE profile TYPE string;
DEFINE FIELD display_name ON TABLE profile TYPE option<string>;
DEFINE FIELD avatar_url ON TABLE profile TYPE option<string>;
DEFINE FIELD role ON TABLE profile TYPE string \
    ASSERT $value IN ['user', 'brand_admin', 'admin', 'super_admin'];
DEFINE FIELD owned_brands ON TABLE profile TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_profile_email ON TABLE profile COLUMNS email;

-- =======================================================================
-- Brands
-- =======================================================================
DEFINE TABLE brand SCHEMAFULL;
DEFINE FIELD name ON TABLE brand TYPE string;
DEFINE FIELD slug ON TABLE brand TYPE string;
DEFINE FIELD created_by ON TABLE brand TYPE option<string>;
DEFINE FIELD created_at ON TABLE brand TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE brand TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_brand_slug ON TABLE brand COLUMNS slug UNIQUE;
DEFINE INDEX idx_brand_created_by ON TABLE brand COLUMNS created_by;
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
