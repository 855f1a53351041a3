//! Demo data: a `system` tenant and a `test` tenant whose user has an
//! "Experience" section with one datagrid, one required `team` column
//! and one row.
//!
//! Every step looks for existing data first, so running the seed twice
//! leaves a single copy of everything.

use anyhow::{Context, Result};
use datagrid_core::models::column::{ColumnFilter, ColumnType, CreateColumn};
use datagrid_core::models::datagrid::{CreateDatagrid, DatagridFilter};
use datagrid_core::models::row::{CreateRow, RowData, RowFilter};
use datagrid_core::models::section::{CreateSection, SectionFilter};
use datagrid_core::models::tenant::{CreateTenant, Tenant};
use datagrid_core::models::user::CreateUser;
use datagrid_core::repository::{
    ColumnRepository, DatagridRepository, RowRepository, SectionRepository, TenantRepository,
    UserRepository,
};
use datagrid_core::schema::SchemaConfig;
use datagrid_db::repository::{
    SurrealColumnRepository, SurrealDatagridRepository, SurrealRowRepository,
    SurrealSectionRepository, SurrealTenantRepository, SurrealUserRepository,
};
use serde::Serialize;
use surrealdb::{Connection, Surreal};
use tracing::info;
use uuid::Uuid;

const TEAM_KEY: &str = "team";

/// Ids of the seeded entities.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub system_tenant_id: Uuid,
    pub test_tenant_id: Uuid,
    pub user_id: Uuid,
    pub section_id: Uuid,
    pub datagrid_id: Uuid,
    pub row_id: Uuid,
}

/// Rows are written under the configured validation mode.
pub async fn seed<C: Connection>(db: &Surreal<C>, schema: &SchemaConfig) -> Result<SeedSummary> {
    let tenants = SurrealTenantRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db.clone());
    let rows = SurrealRowRepository::with_config(db.clone(), schema.clone());

    let system = ensure_tenant(&tenants, "System Tenant", "system").await?;
    let test = ensure_tenant(&tenants, "Test Tenant", "test").await?;

    let user = match users
        .list(test.id)
        .await?
        .into_iter()
        .find(|u| u.email == "test@example.com")
    {
        Some(user) => user,
        None => users
            .create(CreateUser {
                tenant_id: test.id,
                email: "test@example.com".into(),
                first_name: "John".into(),
                last_name: "Doe".into(),
                profile_image_url: None,
            })
            .await
            .context("creating demo user")?,
    };

    let section = match sections
        .list(SectionFilter {
            tenant_id: Some(test.id),
        })
        .await?
        .into_iter()
        .find(|s| s.name == "Experience")
    {
        Some(section) => section,
        None => sections
            .create(CreateSection {
                tenant_id: test.id,
                name: "Experience".into(),
                description: Some("Professional experience and achievements".into()),
                order: Some(1),
            })
            .await
            .context("creating demo section")?,
    };

    let datagrid = match datagrids
        .list(DatagridFilter {
            tenant_id: Some(test.id),
            section_id: Some(section.id),
        })
        .await?
        .into_iter()
        .find(|d| d.name == "Experience")
    {
        Some(datagrid) => datagrid,
        None => datagrids
            .create(CreateDatagrid {
                tenant_id: test.id,
                section_id: section.id,
                name: "Experience".into(),
                description: Some("Professional experience entries".into()),
                order: Some(1),
            })
            .await
            .context("creating demo datagrid")?,
    };

    let has_team_column = columns
        .list(ColumnFilter {
            tenant_id: Some(test.id),
            datagrid_id: Some(datagrid.id),
        })
        .await?
        .iter()
        .any(|c| c.key == TEAM_KEY);
    if !has_team_column {
        columns
            .create(CreateColumn {
                tenant_id: test.id,
                datagrid_id: datagrid.id,
                key: TEAM_KEY.into(),
                label: "Team".into(),
                column_type: ColumnType::Text,
                required: Some(true),
                order: Some(1),
                validation_rules: None,
                config: None,
            })
            .await
            .context("creating demo column")?;
    }

    let existing_row = rows
        .list(RowFilter {
            tenant_id: Some(test.id),
            datagrid_id: Some(datagrid.id),
            user_id: Some(user.id),
        })
        .await?
        .into_iter()
        .next();
    let row = match existing_row {
        Some(row) => row,
        None => {
            let mut data = RowData::new();
            data.insert(TEAM_KEY.into(), "Toronto Raptors".into());
            rows.create(CreateRow {
                tenant_id: test.id,
                user_id: user.id,
                datagrid_id: datagrid.id,
                data,
                order: Some(1),
            })
            .await
            .context("creating demo row")?
        }
    };

    info!(tenant_id = %test.id, section_id = %section.id, "Demo data ready");

    Ok(SeedSummary {
        system_tenant_id: system.id,
        test_tenant_id: test.id,
        user_id: user.id,
        section_id: section.id,
        datagrid_id: datagrid.id,
        row_id: row.id,
    })
}

async fn ensure_tenant<T: TenantRepository>(
    tenants: &T,
    name: &str,
    subdomain: &str,
) -> Result<Tenant> {
    match tenants.get_by_subdomain(subdomain).await {
        Ok(tenant) => Ok(tenant),
        Err(e) if e.is_not_found() => tenants
            .create(CreateTenant {
                name: name.into(),
                subdomain: subdomain.into(),
                domain: None,
                settings: None,
            })
            .await
            .with_context(|| format!("creating tenant '{subdomain}'")),
        Err(e) => Err(e).with_context(|| format!("looking up tenant '{subdomain}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_query::SectionViewService;
    use surrealdb::engine::local::Mem;

    #[tokio::test]
    async fn seed_is_idempotent_and_viewable() {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        datagrid_db::run_migrations(&db).await.unwrap();

        let first = seed(&db, &SchemaConfig::default()).await.unwrap();
        let second = seed(&db, &SchemaConfig::default()).await.unwrap();
        assert_eq!(first.test_tenant_id, second.test_tenant_id);
        assert_eq!(first.row_id, second.row_id);

        let tenants = SurrealTenantRepository::new(db.clone());
        assert_eq!(tenants.list().await.unwrap().len(), 2);

        let service = SectionViewService::new(
            SurrealUserRepository::new(db.clone()),
            SurrealSectionRepository::new(db.clone()),
            SurrealDatagridRepository::new(db.clone()),
            SurrealColumnRepository::new(db.clone()),
            SurrealRowRepository::new(db.clone()),
        );
        let view = service
            .user_section_view(Some(first.test_tenant_id), first.user_id, first.section_id)
            .await
            .unwrap();
        assert_eq!(view.user.email, "test@example.com");
        assert_eq!(view.section.datagrids.len(), 1);
        let grid = &view.section.datagrids[0];
        assert_eq!(grid.columns.len(), 1);
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].data[TEAM_KEY], "Toronto Raptors");
        assert_eq!(grid.rows[0].order, 1);
    }
}
