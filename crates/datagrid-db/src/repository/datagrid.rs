//! SurrealDB implementation of [`DatagridRepository`].

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{assert_same_tenant, ensure_valid_id, new_id};
use datagrid_core::models::datagrid::{CreateDatagrid, Datagrid, DatagridFilter, UpdateDatagrid};
use datagrid_core::repository::DatagridRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::support::{Conditions, DISPLAY_ORDER, parse_uuid, require_text, to_order};
use crate::cascade::{CascadeRoot, cascade_delete};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DatagridRecord {
    record_id: String,
    tenant_id: String,
    section_id: String,
    name: String,
    description: Option<String>,
    sort_order: i64,
    is_active: bool,
    schema_version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DatagridRecord {
    fn try_into_datagrid(self) -> Result<Datagrid, DbError> {
        Ok(Datagrid {
            id: parse_uuid("datagrid", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            section_id: parse_uuid("section", &self.section_id)?,
            name: self.name,
            description: self.description,
            order: to_order(self.sort_order)?,
            is_active: self.is_active,
            schema_version: self.schema_version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Look up a datagrid, optionally restricted to one tenant.
pub(crate) async fn find<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Option<Uuid>,
    id: Uuid,
) -> Result<Option<Datagrid>, DbError> {
    let conditions = Conditions::new().eq("tenant_id", tenant_id);
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM type::record('datagrid', $id){}",
        conditions.where_clause()
    );
    let mut builder = db.query(query).bind(("id", id.to_string()));
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<DatagridRecord> = result.take(0)?;
    rows.into_iter().next().map(DatagridRecord::try_into_datagrid).transpose()
}

/// SurrealDB implementation of the Datagrid repository.
#[derive(Clone)]
pub struct SurrealDatagridRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDatagridRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DatagridRepository for SurrealDatagridRepository<C> {
    async fn create(&self, input: CreateDatagrid) -> DatagridResult<Datagrid> {
        ensure_valid_id("tenant", input.tenant_id)?;
        ensure_valid_id("section", input.section_id)?;
        require_text("datagrid name", &input.name)?;

        let section = super::section::find(&self.db, None, input.section_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("section", input.section_id))?;
        if let Err(e) = assert_same_tenant("section", section.tenant_id, input.tenant_id) {
            warn!(section_id = %section.id, tenant_id = %input.tenant_id, "Datagrid rejected: {e}");
            return Err(e.into());
        }

        let id = new_id();
        let result = self
            .db
            .query(
                "CREATE type::record('datagrid', $id) SET \
                 tenant_id = $tenant_id, section_id = $section_id, \
                 name = $name, description = $description, \
                 sort_order = $sort_order",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("section_id", input.section_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("sort_order", i64::from(input.order.unwrap_or(0))))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(
            tenant_id = %input.tenant_id,
            section_id = %input.section_id,
            datagrid_id = %id,
            "Datagrid created"
        );
        self.get_by_id(None, id).await
    }

    async fn get_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<Datagrid> {
        find(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("datagrid", id))
    }

    async fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateDatagrid,
    ) -> DatagridResult<Datagrid> {
        self.get_by_id(tenant_id, id).await?;
        if let Some(name) = &input.name {
            require_text("datagrid name", name)?;
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('datagrid', $id) SET {}", sets.join(", "));
        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(order) = input.order {
            builder = builder.bind(("sort_order", i64::from(order)));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(datagrid_id = %id, "Datagrid updated");
        self.get_by_id(None, id).await
    }

    async fn delete(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<()> {
        self.get_by_id(tenant_id, id).await?;
        cascade_delete(&self.db, CascadeRoot::Datagrid(id)).await?;
        Ok(())
    }

    async fn list(&self, filter: DatagridFilter) -> DatagridResult<Vec<Datagrid>> {
        let conditions = Conditions::new()
            .eq("tenant_id", filter.tenant_id)
            .eq("section_id", filter.section_id);
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM datagrid{} {DISPLAY_ORDER}",
            conditions.where_clause()
        );
        let mut builder = self.db.query(query);
        for bind in conditions.into_binds() {
            builder = builder.bind(bind);
        }
        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DatagridRecord> = result.take(0).map_err(DbError::from)?;

        let datagrids = rows
            .into_iter()
            .map(DatagridRecord::try_into_datagrid)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(datagrids)
    }
}
