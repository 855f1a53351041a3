//! SurrealDB implementation of [`SectionRepository`].

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{assert_same_tenant, ensure_valid_id, new_id};
use datagrid_core::models::section::{CreateSection, Section, SectionFilter, UpdateSection};
use datagrid_core::repository::SectionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::support::{Conditions, DISPLAY_ORDER, parse_uuid, require_text, to_order};
use crate::cascade::{CascadeRoot, cascade_delete};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SectionRecord {
    record_id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    sort_order: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SectionRecord {
    fn try_into_section(self) -> Result<Section, DbError> {
        Ok(Section {
            id: parse_uuid("section", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            name: self.name,
            description: self.description,
            order: to_order(self.sort_order)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Look up a section, optionally restricted to one tenant.
pub(crate) async fn find<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Option<Uuid>,
    id: Uuid,
) -> Result<Option<Section>, DbError> {
    let conditions = Conditions::new().eq("tenant_id", tenant_id);
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM type::record('section', $id){}",
        conditions.where_clause()
    );
    let mut builder = db.query(query).bind(("id", id.to_string()));
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<SectionRecord> = result.take(0)?;
    rows.into_iter().next().map(SectionRecord::try_into_section).transpose()
}

/// SurrealDB implementation of the Section repository.
#[derive(Clone)]
pub struct SurrealSectionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSectionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SectionRepository for SurrealSectionRepository<C> {
    async fn create(&self, input: CreateSection) -> DatagridResult<Section> {
        ensure_valid_id("tenant", input.tenant_id)?;
        require_text("section name", &input.name)?;

        let tenant = super::tenant::find(&self.db, input.tenant_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("tenant", input.tenant_id))?;
        assert_same_tenant("tenant", tenant.id, input.tenant_id)?;

        let id = new_id();
        let result = self
            .db
            .query(
                "CREATE type::record('section', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 description = $description, sort_order = $sort_order",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("sort_order", i64::from(input.order.unwrap_or(0))))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(tenant_id = %input.tenant_id, section_id = %id, "Section created");
        self.get_by_id(None, id).await
    }

    async fn get_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<Section> {
        debug!(section_id = %id, "Fetching section");
        find(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("section", id))
    }

    async fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateSection,
    ) -> DatagridResult<Section> {
        self.get_by_id(tenant_id, id).await?;
        if let Some(name) = &input.name {
            require_text("section name", name)?;
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

        let query = format!("UPDATE type::record('section', $id) SET {}", sets.join(", "));
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

        debug!(section_id = %id, "Section updated");
        self.get_by_id(None, id).await
    }

    async fn delete(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<()> {
        self.get_by_id(tenant_id, id).await?;
        cascade_delete(&self.db, CascadeRoot::Section(id)).await?;
        Ok(())
    }

    async fn list(&self, filter: SectionFilter) -> DatagridResult<Vec<Section>> {
        let conditions = Conditions::new().eq("tenant_id", filter.tenant_id);
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM section{} {DISPLAY_ORDER}",
            conditions.where_clause()
        );
        let mut builder = self.db.query(query);
        for bind in conditions.into_binds() {
            builder = builder.bind(bind);
        }
        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<SectionRecord> = result.take(0).map_err(DbError::from)?;

        let sections = rows
            .into_iter()
            .map(SectionRecord::try_into_section)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(sections)
    }
}
