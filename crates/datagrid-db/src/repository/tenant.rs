//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{ensure_valid_id, new_id};
use datagrid_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use datagrid_core::repository::TenantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::support::{optional_object, parse_uuid, require_text};
use crate::cascade::{CascadeRoot, cascade_delete};
use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRecord {
    record_id: String,
    name: String,
    subdomain: String,
    domain: Option<String>,
    is_active: bool,
    settings: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRecord {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid("tenant", &self.record_id)?,
            name: self.name,
            subdomain: self.subdomain,
            domain: self.domain,
            is_active: self.is_active,
            settings: self.settings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) async fn find<C: Connection>(
    db: &Surreal<C>,
    id: Uuid,
) -> Result<Option<Tenant>, DbError> {
    let mut result = db
        .query("SELECT meta::id(id) AS record_id, * FROM type::record('tenant', $id)")
        .bind(("id", id.to_string()))
        .await?;
    let rows: Vec<TenantRecord> = result.take(0)?;
    rows.into_iter().next().map(TenantRecord::try_into_tenant).transpose()
}

async fn find_by_subdomain<C: Connection>(
    db: &Surreal<C>,
    subdomain: &str,
) -> Result<Option<Tenant>, DbError> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM tenant \
             WHERE subdomain = $subdomain LIMIT 1",
        )
        .bind(("subdomain", subdomain.to_string()))
        .await?;
    let rows: Vec<TenantRecord> = result.take(0)?;
    rows.into_iter().next().map(TenantRecord::try_into_tenant).transpose()
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Distinguishes a subdomain collision from other write failures.
    async fn diagnose_write(&self, subdomain: &str, own_id: Uuid, err: String) -> DatagridError {
        match find_by_subdomain(&self.db, subdomain).await {
            Ok(Some(existing)) if existing.id != own_id => DatagridError::AlreadyExists {
                entity: "tenant".into(),
            },
            _ => DbError::Query(err).into(),
        }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> DatagridResult<Tenant> {
        require_text("tenant name", &input.name)?;
        require_text("subdomain", &input.subdomain)?;
        let settings = optional_object("tenant settings", input.settings)?
            .unwrap_or(serde_json::Value::Object(Default::default()));

        if find_by_subdomain(&self.db, &input.subdomain).await?.is_some() {
            return Err(DatagridError::AlreadyExists {
                entity: "tenant".into(),
            });
        }

        let id = new_id();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, subdomain = $subdomain, \
                 domain = $domain, settings = $settings",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("subdomain", input.subdomain.clone()))
            .bind(("domain", input.domain))
            .bind(("settings", settings))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            return Err(self.diagnose_write(&input.subdomain, id, e.to_string()).await);
        }

        info!(tenant_id = %id, subdomain = %input.subdomain, "Tenant created");
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> DatagridResult<Tenant> {
        find(&self.db, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("tenant", id))
    }

    async fn get_by_subdomain(&self, subdomain: &str) -> DatagridResult<Tenant> {
        find_by_subdomain(&self.db, subdomain)
            .await?
            .ok_or_else(|| DatagridError::not_found("tenant", format!("subdomain={subdomain}")))
    }

    async fn update(&self, id: Uuid, mut input: UpdateTenant) -> DatagridResult<Tenant> {
        ensure_valid_id("tenant", id)?;
        self.get_by_id(id).await?;
        input.settings = optional_object("tenant settings", input.settings)?;

        if let Some(name) = &input.name {
            require_text("tenant name", name)?;
        }
        if let Some(subdomain) = &input.subdomain {
            require_text("subdomain", subdomain)?;
            if let Some(existing) = find_by_subdomain(&self.db, subdomain).await? {
                if existing.id != id {
                    return Err(DatagridError::AlreadyExists {
                        entity: "tenant".into(),
                    });
                }
            }
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.subdomain.is_some() {
            sets.push("subdomain = $subdomain");
        }
        if input.domain.is_some() {
            sets.push("domain = $domain");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.settings.is_some() {
            sets.push("settings = $settings");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('tenant', $id) SET {}", sets.join(", "));
        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        let new_subdomain = input.subdomain.clone();
        if let Some(subdomain) = input.subdomain {
            builder = builder.bind(("subdomain", subdomain));
        }
        if let Some(domain) = input.domain {
            builder = builder.bind(("domain", domain));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(settings) = input.settings {
            builder = builder.bind(("settings", settings));
        }

        let result = builder.await.map_err(DbError::from)?;
        if let Err(e) = result.check() {
            return Err(match new_subdomain {
                Some(subdomain) => self.diagnose_write(&subdomain, id, e.to_string()).await,
                None => DbError::Query(e.to_string()).into(),
            });
        }

        debug!(tenant_id = %id, "Tenant updated");
        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> DatagridResult<()> {
        self.get_by_id(id).await?;
        cascade_delete(&self.db, CascadeRoot::Tenant(id)).await?;
        Ok(())
    }

    async fn list(&self) -> DatagridResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM tenant ORDER BY created_at ASC")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<TenantRecord> = result.take(0).map_err(DbError::from)?;

        let tenants = rows
            .into_iter()
            .map(TenantRecord::try_into_tenant)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(tenants)
    }
}
