//! SurrealDB implementation of [`ColumnRepository`].
//!
//! Every column write bumps the owning datagrid's `schema_version` in
//! the same transaction, which row writes use to detect concurrent
//! schema edits.

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{assert_same_tenant, ensure_valid_id, new_id};
use datagrid_core::models::column::{Column, ColumnFilter, CreateColumn, UpdateColumn};
use datagrid_core::repository::ColumnRepository;
use datagrid_core::schema::validate_definition;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::support::{Conditions, DISPLAY_ORDER, non_null, parse_uuid, require_text, to_order};
use crate::error::DbError;

const BUMP_SCHEMA_VERSION: &str =
    "UPDATE type::record('datagrid', $datagrid_id) SET schema_version += 1";

#[derive(Debug, SurrealValue)]
struct ColumnRecord {
    record_id: String,
    tenant_id: String,
    datagrid_id: String,
    column_key: String,
    label: String,
    column_type: String,
    required: bool,
    sort_order: i64,
    validation_rules: Option<serde_json::Value>,
    config: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ColumnRecord {
    fn try_into_column(self) -> Result<Column, DbError> {
        Ok(Column {
            id: parse_uuid("column", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            datagrid_id: parse_uuid("datagrid", &self.datagrid_id)?,
            column_type: self.column_type.parse().map_err(DbError::Decode)?,
            key: self.column_key,
            label: self.label,
            required: self.required,
            order: to_order(self.sort_order)?,
            validation_rules: self.validation_rules,
            config: self.config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Look up a column, optionally restricted to one tenant.
pub(crate) async fn find<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Option<Uuid>,
    id: Uuid,
) -> Result<Option<Column>, DbError> {
    let conditions = Conditions::new().eq("tenant_id", tenant_id);
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM type::record('datagrid_column', $id){}",
        conditions.where_clause()
    );
    let mut builder = db.query(query).bind(("id", id.to_string()));
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<ColumnRecord> = result.take(0)?;
    rows.into_iter().next().map(ColumnRecord::try_into_column).transpose()
}

pub(crate) async fn list_matching<C: Connection>(
    db: &Surreal<C>,
    conditions: Conditions,
) -> Result<Vec<Column>, DbError> {
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM datagrid_column{} {DISPLAY_ORDER}",
        conditions.where_clause()
    );
    let mut builder = db.query(query);
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<ColumnRecord> = result.take(0)?;
    rows.into_iter().map(ColumnRecord::try_into_column).collect()
}

/// Id of the column currently holding `key`, in any datagrid of any
/// tenant.
async fn key_owner<C: Connection>(db: &Surreal<C>, key: &str) -> Result<Option<Uuid>, DbError> {
    let mut result = db
        .query("SELECT VALUE meta::id(id) FROM datagrid_column WHERE column_key = $key LIMIT 1")
        .bind(("key", key.to_string()))
        .await?;
    let ids: Vec<String> = result.take(0)?;
    ids.first().map(|id| parse_uuid("column", id)).transpose()
}

fn check_definition(column: &Column) -> DatagridResult<()> {
    validate_definition(
        column.column_type,
        column.validation_rules.as_ref(),
        column.config.as_ref(),
    )
    .map_err(|msg| DatagridError::invalid_input(format!("column '{}': {msg}", column.key)))
}

/// SurrealDB implementation of the Column repository.
#[derive(Clone)]
pub struct SurrealColumnRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealColumnRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn ensure_key_free(&self, key: &str, own_id: Uuid) -> DatagridResult<()> {
        match key_owner(&self.db, key).await? {
            Some(owner) if owner != own_id => {
                warn!(key, "Column key already in use");
                Err(DatagridError::DuplicateKey { key: key.into() })
            }
            _ => Ok(()),
        }
    }

    /// Maps a failed column transaction to `DuplicateKey` when another
    /// column grabbed the key in the meantime.
    async fn diagnose_write(&self, key: &str, own_id: Uuid, err: String) -> DatagridError {
        match key_owner(&self.db, key).await {
            Ok(Some(owner)) if owner != own_id => DatagridError::DuplicateKey { key: key.into() },
            _ => DbError::Integrity(format!("column write rolled back: {err}")).into(),
        }
    }
}

impl<C: Connection> ColumnRepository for SurrealColumnRepository<C> {
    async fn create(&self, input: CreateColumn) -> DatagridResult<Column> {
        ensure_valid_id("tenant", input.tenant_id)?;
        ensure_valid_id("datagrid", input.datagrid_id)?;
        require_text("column key", &input.key)?;
        require_text("column label", &input.label)?;
        validate_definition(
            input.column_type,
            input.validation_rules.as_ref(),
            input.config.as_ref(),
        )
        .map_err(|msg| DatagridError::invalid_input(format!("column '{}': {msg}", input.key)))?;

        let datagrid = super::datagrid::find(&self.db, None, input.datagrid_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("datagrid", input.datagrid_id))?;
        if let Err(e) = assert_same_tenant("datagrid", datagrid.tenant_id, input.tenant_id) {
            warn!(datagrid_id = %datagrid.id, tenant_id = %input.tenant_id, "Column rejected: {e}");
            return Err(e.into());
        }

        let id = new_id();
        self.ensure_key_free(&input.key, id).await?;

        let result = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 CREATE type::record('datagrid_column', $id) SET \
                 tenant_id = $tenant_id, datagrid_id = $datagrid_id, \
                 column_key = $key, label = $label, column_type = $column_type, \
                 required = $required, sort_order = $sort_order, \
                 validation_rules = $validation_rules, config = $config; \
                 {BUMP_SCHEMA_VERSION}; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("datagrid_id", input.datagrid_id.to_string()))
            .bind(("key", input.key.clone()))
            .bind(("label", input.label))
            .bind(("column_type", input.column_type.as_str().to_string()))
            .bind(("required", input.required.unwrap_or(false)))
            .bind(("sort_order", i64::from(input.order.unwrap_or(0))))
            .bind(("validation_rules", non_null(input.validation_rules)))
            .bind(("config", non_null(input.config)))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            return Err(self.diagnose_write(&input.key, id, e.to_string()).await);
        }

        info!(
            tenant_id = %input.tenant_id,
            datagrid_id = %input.datagrid_id,
            column_id = %id,
            key = %input.key,
            "Column created"
        );
        self.get_by_id(None, id).await
    }

    async fn get_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<Column> {
        find(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("column", id))
    }

    async fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateColumn,
    ) -> DatagridResult<Column> {
        let current = self.get_by_id(tenant_id, id).await?;

        // The definition after the update must be coherent as a whole,
        // e.g. changing the type alone may invalidate existing rules.
        let mut merged = current.clone();
        if let Some(key) = &input.key {
            require_text("column key", key)?;
            merged.key = key.clone();
        }
        if let Some(label) = &input.label {
            require_text("column label", label)?;
        }
        if let Some(column_type) = input.column_type {
            merged.column_type = column_type;
        }
        if let Some(rules) = &input.validation_rules {
            merged.validation_rules = non_null(rules.clone());
        }
        if let Some(config) = &input.config {
            merged.config = non_null(config.clone());
        }
        check_definition(&merged)?;

        if input.key.is_some() && merged.key != current.key {
            self.ensure_key_free(&merged.key, id).await?;
        }

        let mut sets = Vec::new();
        if input.key.is_some() {
            sets.push("column_key = $key");
        }
        if input.label.is_some() {
            sets.push("label = $label");
        }
        if input.column_type.is_some() {
            sets.push("column_type = $column_type");
        }
        if input.required.is_some() {
            sets.push("required = $required");
        }
        if input.order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        if input.validation_rules.is_some() {
            sets.push("validation_rules = $validation_rules");
        }
        if input.config.is_some() {
            sets.push("config = $config");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('datagrid_column', $id) SET {}; \
             {BUMP_SCHEMA_VERSION}; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );
        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("datagrid_id", current.datagrid_id.to_string()));

        if let Some(key) = input.key {
            builder = builder.bind(("key", key));
        }
        if let Some(label) = input.label {
            builder = builder.bind(("label", label));
        }
        if let Some(column_type) = input.column_type {
            builder = builder.bind(("column_type", column_type.as_str().to_string()));
        }
        if let Some(required) = input.required {
            builder = builder.bind(("required", required));
        }
        if let Some(order) = input.order {
            builder = builder.bind(("sort_order", i64::from(order)));
        }
        if let Some(rules) = input.validation_rules {
            builder = builder.bind(("validation_rules", non_null(rules)));
        }
        if let Some(config) = input.config {
            builder = builder.bind(("config", non_null(config)));
        }

        let result = builder.await.map_err(DbError::from)?;
        if let Err(e) = result.check() {
            return Err(self.diagnose_write(&merged.key, id, e.to_string()).await);
        }

        debug!(column_id = %id, datagrid_id = %current.datagrid_id, "Column updated");
        self.get_by_id(None, id).await
    }

    async fn delete(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<()> {
        let current = self.get_by_id(tenant_id, id).await?;

        let result = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 DELETE type::record('datagrid_column', $id); \
                 {BUMP_SCHEMA_VERSION}; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", id.to_string()))
            .bind(("datagrid_id", current.datagrid_id.to_string()))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Integrity(format!("column delete rolled back: {e}")))?;

        info!(column_id = %id, key = %current.key, "Column deleted");
        Ok(())
    }

    async fn list(&self, filter: ColumnFilter) -> DatagridResult<Vec<Column>> {
        let conditions = Conditions::new()
            .eq("tenant_id", filter.tenant_id)
            .eq("datagrid_id", filter.datagrid_id);
        Ok(list_matching(&self.db, conditions).await?)
    }
}
