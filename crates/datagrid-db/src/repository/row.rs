//! SurrealDB implementation of [`RowRepository`].
//!
//! Row payloads pass through the schema engine before they are
//! written. Validation runs against the column set read at the
//! datagrid's current `schema_version`, and the write itself only
//! commits if that version is unchanged, so a row is never persisted
//! against a schema that was edited mid-flight.

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{assert_same_tenant, ensure_valid_id, new_id};
use datagrid_core::models::datagrid::Datagrid;
use datagrid_core::models::row::{CreateRow, Row, RowData, RowFilter, UpdateRow};
use datagrid_core::repository::RowRepository;
use datagrid_core::schema::{SchemaConfig, validate};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::support::{Conditions, DISPLAY_ORDER, parse_uuid, to_order};
use crate::error::DbError;

/// Aborts the surrounding transaction when the datagrid's schema moved
/// past `$schema_version`.
const SCHEMA_GUARD: &str = "\
LET $current = (SELECT VALUE schema_version FROM type::record('datagrid', $datagrid_id))[0]; \
IF $current != $schema_version { THROW 'datagrid schema changed during row write'; };";

#[derive(Debug, SurrealValue)]
struct RowRecord {
    record_id: String,
    tenant_id: String,
    user_id: String,
    datagrid_id: String,
    data: serde_json::Value,
    sort_order: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RowRecord {
    fn try_into_row(self) -> Result<Row, DbError> {
        let data = match self.data {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(DbError::Decode(format!(
                    "row data must be an object, got {other}"
                )));
            }
        };
        Ok(Row {
            id: parse_uuid("row", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            datagrid_id: parse_uuid("datagrid", &self.datagrid_id)?,
            data,
            order: to_order(self.sort_order)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

async fn find<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Option<Uuid>,
    id: Uuid,
) -> Result<Option<Row>, DbError> {
    let conditions = Conditions::new().eq("tenant_id", tenant_id);
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM type::record('datagrid_row', $id){}",
        conditions.where_clause()
    );
    let mut builder = db.query(query).bind(("id", id.to_string()));
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<RowRecord> = result.take(0)?;
    rows.into_iter().next().map(RowRecord::try_into_row).transpose()
}

/// SurrealDB implementation of the Row repository.
#[derive(Clone)]
pub struct SurrealRowRepository<C: Connection> {
    db: Surreal<C>,
    schema: SchemaConfig,
}

impl<C: Connection> SurrealRowRepository<C> {
    /// Unknown payload keys are accepted and stored as given.
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_config(db, SchemaConfig::default())
    }

    pub fn with_config(db: Surreal<C>, schema: SchemaConfig) -> Self {
        Self { db, schema }
    }

    /// Validate `data` against the datagrid's columns as of
    /// `datagrid.schema_version`.
    async fn validate_payload(
        &self,
        datagrid: &Datagrid,
        data: &RowData,
    ) -> DatagridResult<RowData> {
        let columns = super::column::list_matching(
            &self.db,
            Conditions::new().eq("datagrid_id", Some(datagrid.id)),
        )
        .await?;

        validate(&columns, data, self.schema.mode).map_err(|errors| {
            warn!(
                datagrid_id = %datagrid.id,
                schema_version = datagrid.schema_version,
                failures = errors.len(),
                "Row payload rejected"
            );
            DatagridError::Validation { errors }
        })
    }

    /// Persist a validated payload. Commits only while the datagrid is
    /// still at `datagrid.schema_version`.
    async fn insert(
        &self,
        datagrid: &Datagrid,
        input: &CreateRow,
        data: RowData,
    ) -> DatagridResult<Uuid> {
        let id = new_id();
        let result = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; {SCHEMA_GUARD} \
                 CREATE type::record('datagrid_row', $id) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 datagrid_id = $datagrid_id, data = $data, \
                 sort_order = $sort_order; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("datagrid_id", datagrid.id.to_string()))
            .bind(("data", serde_json::Value::Object(data)))
            .bind(("sort_order", i64::from(input.order.unwrap_or(0))))
            .bind(("schema_version", datagrid.schema_version))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            return Err(self.diagnose_write(datagrid, e.to_string()).await);
        }
        Ok(id)
    }

    async fn diagnose_write(&self, datagrid: &Datagrid, err: String) -> DatagridError {
        let moved = matches!(
            super::datagrid::find(&self.db, None, datagrid.id).await,
            Ok(Some(latest)) if latest.schema_version != datagrid.schema_version
        );
        if moved {
            warn!(datagrid_id = %datagrid.id, "Row write aborted by concurrent schema change");
            DbError::Integrity(format!(
                "schema of datagrid {} changed during row write",
                datagrid.id
            ))
            .into()
        } else {
            DbError::Integrity(format!("row write rolled back: {err}")).into()
        }
    }
}

impl<C: Connection> RowRepository for SurrealRowRepository<C> {
    async fn create(&self, input: CreateRow) -> DatagridResult<Row> {
        ensure_valid_id("tenant", input.tenant_id)?;
        ensure_valid_id("datagrid", input.datagrid_id)?;
        ensure_valid_id("user", input.user_id)?;

        let datagrid = super::datagrid::find(&self.db, None, input.datagrid_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("datagrid", input.datagrid_id))?;
        if let Err(e) = assert_same_tenant("datagrid", datagrid.tenant_id, input.tenant_id) {
            warn!(datagrid_id = %datagrid.id, tenant_id = %input.tenant_id, "Row rejected: {e}");
            return Err(e.into());
        }

        let user = super::user::find(&self.db, None, input.user_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("user", input.user_id))?;
        if let Err(e) = assert_same_tenant("user", user.tenant_id, input.tenant_id) {
            warn!(user_id = %user.id, tenant_id = %input.tenant_id, "Row rejected: {e}");
            return Err(e.into());
        }

        let data = self.validate_payload(&datagrid, &input.data).await?;

        let id = self.insert(&datagrid, &input, data).await?;

        info!(
            tenant_id = %input.tenant_id,
            datagrid_id = %input.datagrid_id,
            user_id = %input.user_id,
            row_id = %id,
            "Row created"
        );
        self.get_by_id(None, id).await
    }

    async fn get_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<Row> {
        find(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("row", id))
    }

    async fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateRow,
    ) -> DatagridResult<Row> {
        let current = self.get_by_id(tenant_id, id).await?;

        let mut sets = Vec::new();
        if input.data.is_some() {
            sets.push("data = $data");
        }
        if input.order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");
        let update = format!(
            "UPDATE type::record('datagrid_row', $id) SET {};",
            sets.join(", ")
        );

        let mut guarded_by = None;
        let query = match &input.data {
            Some(data) => {
                let datagrid = super::datagrid::find(&self.db, None, current.datagrid_id)
                    .await?
                    .ok_or_else(|| DatagridError::not_found("datagrid", current.datagrid_id))?;
                let normalized = self.validate_payload(&datagrid, data).await?;
                guarded_by = Some((datagrid, normalized));
                format!("BEGIN TRANSACTION; {SCHEMA_GUARD} {update} COMMIT TRANSACTION;")
            }
            None => update,
        };

        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        if let Some((datagrid, normalized)) = &guarded_by {
            builder = builder
                .bind(("datagrid_id", datagrid.id.to_string()))
                .bind(("schema_version", datagrid.schema_version))
                .bind(("data", serde_json::Value::Object(normalized.clone())));
        }
        if let Some(order) = input.order {
            builder = builder.bind(("sort_order", i64::from(order)));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        if let Err(e) = result.check() {
            return Err(match &guarded_by {
                Some((datagrid, _)) => self.diagnose_write(datagrid, e.to_string()).await,
                None => DbError::Query(e.to_string()).into(),
            });
        }

        debug!(row_id = %id, revalidated = guarded_by.is_some(), "Row updated");
        self.get_by_id(None, id).await
    }

    async fn delete(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<()> {
        self.get_by_id(tenant_id, id).await?;

        let result = self
            .db
            .query("DELETE type::record('datagrid_row', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(row_id = %id, "Row deleted");
        Ok(())
    }

    async fn list(&self, filter: RowFilter) -> DatagridResult<Vec<Row>> {
        let conditions = Conditions::new()
            .eq("tenant_id", filter.tenant_id)
            .eq("datagrid_id", filter.datagrid_id)
            .eq("user_id", filter.user_id);
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM datagrid_row{} {DISPLAY_ORDER}",
            conditions.where_clause()
        );
        let mut builder = self.db.query(query);
        for bind in conditions.into_binds() {
            builder = builder.bind(bind);
        }
        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<RowRecord> = result.take(0).map_err(DbError::from)?;

        let rows = rows
            .into_iter()
            .map(RowRecord::try_into_row)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(rows)
    }
}
