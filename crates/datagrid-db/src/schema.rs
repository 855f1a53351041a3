//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings; the record key
//! of every entity is its UUID. Free-form JSON (tenant settings, column
//! rules and config, row data) lives in FLEXIBLE object fields. The
//! `order` of an entity is stored as `sort_order`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

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
struct AppliedMigration {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "datagrid_hierarchy",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (root)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD subdomain ON TABLE tenant TYPE string;
DEFINE FIELD domain ON TABLE tenant TYPE option<string>;
DEFINE FIELD is_active ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD settings ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_subdomain ON TABLE tenant \
    COLUMNS subdomain UNIQUE;

-- =======================================================================
-- Users (tenant scope)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD profile_image_url ON TABLE user TYPE option<string>;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_tenant_email ON TABLE user \
    COLUMNS tenant_id, email UNIQUE;

-- =======================================================================
-- Sections (tenant scope)
-- =======================================================================
DEFINE TABLE section SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE section TYPE string;
DEFINE FIELD name ON TABLE section TYPE string;
DEFINE FIELD description ON TABLE section TYPE option<string>;
DEFINE FIELD sort_order ON TABLE section TYPE int DEFAULT 0;
DEFINE FIELD is_active ON TABLE section TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_section_tenant ON TABLE section COLUMNS tenant_id;

-- =======================================================================
-- Datagrids (section scope)
-- =======================================================================
DEFINE TABLE datagrid SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE datagrid TYPE string;
DEFINE FIELD section_id ON TABLE datagrid TYPE string;
DEFINE FIELD name ON TABLE datagrid TYPE string;
DEFINE FIELD description ON TABLE datagrid TYPE option<string>;
DEFINE FIELD sort_order ON TABLE datagrid TYPE int DEFAULT 0;
DEFINE FIELD is_active ON TABLE datagrid TYPE bool DEFAULT true;
DEFINE FIELD schema_version ON TABLE datagrid TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE datagrid TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE datagrid TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_datagrid_tenant ON TABLE datagrid COLUMNS tenant_id;
DEFINE INDEX idx_datagrid_section ON TABLE datagrid COLUMNS section_id;

-- =======================================================================
-- Datagrid columns (datagrid scope, key unique system-wide)
-- =======================================================================
DEFINE TABLE datagrid_column SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE datagrid_column TYPE string;
DEFINE FIELD datagrid_id ON TABLE datagrid_column TYPE string;
DEFINE FIELD column_key ON TABLE datagrid_column TYPE string;
DEFINE FIELD label ON TABLE datagrid_column TYPE string;
DEFINE FIELD column_type ON TABLE datagrid_column TYPE string \
    ASSERT $value IN ['text', 'number', 'email', 'url', 'date', \
    'datetime', 'boolean', 'select', 'textarea'];
DEFINE FIELD required ON TABLE datagrid_column TYPE bool DEFAULT false;
DEFINE FIELD sort_order ON TABLE datagrid_column TYPE int DEFAULT 0;
DEFINE FIELD validation_rules ON TABLE datagrid_column \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD config ON TABLE datagrid_column \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD created_at ON TABLE datagrid_column TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE datagrid_column TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_column_key ON TABLE datagrid_column \
    COLUMNS column_key UNIQUE;
DEFINE INDEX idx_column_datagrid ON TABLE datagrid_column \
    COLUMNS datagrid_id;

-- =======================================================================
-- Datagrid rows (datagrid scope, authored by a user)
-- =======================================================================
DEFINE TABLE datagrid_row SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE datagrid_row TYPE string;
DEFINE FIELD user_id ON TABLE datagrid_row TYPE string;
DEFINE FIELD datagrid_id ON TABLE datagrid_row TYPE string;
DEFINE FIELD data ON TABLE datagrid_row TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD sort_order ON TABLE datagrid_row TYPE int DEFAULT 0;
DEFINE FIELD is_active ON TABLE datagrid_row TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE datagrid_row TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE datagrid_row TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_row_datagrid_user ON TABLE datagrid_row \
    COLUMNS datagrid_id, user_id;
DEFINE INDEX idx_row_tenant ON TABLE datagrid_row COLUMNS tenant_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the highest applied version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<AppliedMigration> = result.take(0)?;
    let current_version = applied.first().map(|m| m.version).unwrap_or(0);
    debug!(current_version, "Schema version before migrations");

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "could not record v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_core::models::column::ColumnType;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn column_type_assertion_lists_every_type() {
        for column_type in ColumnType::ALL {
            assert!(
                SCHEMA_V1.contains(&format!("'{}'", column_type.as_str())),
                "column_type assertion is missing {column_type}"
            );
        }
    }

    #[test]
    fn column_key_is_unique_without_tenant_prefix() {
        assert!(SCHEMA_V1.contains("COLUMNS column_key UNIQUE"));
    }
}
