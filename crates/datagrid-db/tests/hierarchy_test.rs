//! Integration tests for the Section, Datagrid and Column repositories
//! using in-memory SurrealDB.

use datagrid_core::error::DatagridError;
use datagrid_core::models::column::{ColumnFilter, ColumnType, CreateColumn, UpdateColumn};
use datagrid_core::models::datagrid::{CreateDatagrid, DatagridFilter, UpdateDatagrid};
use datagrid_core::models::section::{CreateSection, SectionFilter, UpdateSection};
use datagrid_core::models::tenant::{CreateTenant, UpdateTenant};
use datagrid_core::repository::{
    ColumnRepository, DatagridRepository, SectionRepository, TenantRepository,
};
use datagrid_db::repository::{
    SurrealColumnRepository, SurrealDatagridRepository, SurrealSectionRepository,
    SurrealTenantRepository,
};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create two tenants.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    datagrid_db::run_migrations(&db).await.unwrap();

    let tenants = SurrealTenantRepository::new(db.clone());
    let mut ids = Vec::new();
    for subdomain in ["t1", "t2"] {
        let tenant = tenants
            .create(CreateTenant {
                name: subdomain.to_uppercase(),
                subdomain: subdomain.into(),
                domain: None,
                settings: None,
            })
            .await
            .unwrap();
        ids.push(tenant.id);
    }

    (db, ids[0], ids[1])
}

fn section_input(tenant_id: Uuid, name: &str, order: Option<i32>) -> CreateSection {
    CreateSection {
        tenant_id,
        name: name.into(),
        description: None,
        order,
    }
}

fn datagrid_input(tenant_id: Uuid, section_id: Uuid, name: &str) -> CreateDatagrid {
    CreateDatagrid {
        tenant_id,
        section_id,
        name: name.into(),
        description: None,
        order: None,
    }
}

fn column_input(tenant_id: Uuid, datagrid_id: Uuid, key: &str) -> CreateColumn {
    CreateColumn {
        tenant_id,
        datagrid_id,
        key: key.into(),
        label: key.to_uppercase(),
        column_type: ColumnType::Text,
        required: None,
        order: None,
        validation_rules: None,
        config: None,
    }
}

#[tokio::test]
async fn create_section_defaults() {
    let (db, t1, _) = setup().await;
    let repo = SurrealSectionRepository::new(db);

    let section = repo
        .create(section_input(t1, "Experience", None))
        .await
        .unwrap();
    assert_eq!(section.tenant_id, t1);
    assert_eq!(section.order, 0);
    assert!(section.is_active);
    assert_eq!(section.description, None);

    let fetched = repo.get_by_id(Some(t1), section.id).await.unwrap();
    assert_eq!(fetched.name, "Experience");
}

#[tokio::test]
async fn create_section_for_missing_tenant_fails() {
    let (db, _, _) = setup().await;
    let repo = SurrealSectionRepository::new(db);

    let err = repo
        .create(section_input(Uuid::new_v4(), "Experience", None))
        .await
        .unwrap_err();
    match err {
        DatagridError::NotFound { entity, .. } => assert_eq!(entity, "tenant"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn inactive_tenant_still_accepts_sections() {
    let (db, t1, _) = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let sections = SurrealSectionRepository::new(db);

    tenants
        .update(
            t1,
            UpdateTenant {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    sections
        .create(section_input(t1, "Experience", None))
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_sections_of_empty_tenant_is_empty() {
    let (db, t1, _) = setup().await;
    let repo = SurrealSectionRepository::new(db);

    let sections = repo
        .list(SectionFilter {
            tenant_id: Some(t1),
        })
        .await
        .unwrap();
    assert!(sections.is_empty());
}

#[tokio::test]
async fn sections_list_by_order_then_newest() {
    let (db, t1, t2) = setup().await;
    let repo = SurrealSectionRepository::new(db);

    let low = repo.create(section_input(t1, "Low", Some(1))).await.unwrap();
    let older_high = repo
        .create(section_input(t1, "Older high", Some(5)))
        .await
        .unwrap();
    let newer_high = repo
        .create(section_input(t1, "Newer high", Some(5)))
        .await
        .unwrap();
    repo.create(section_input(t2, "Elsewhere", Some(9)))
        .await
        .unwrap();

    let ids: Vec<Uuid> = repo
        .list(SectionFilter {
            tenant_id: Some(t1),
        })
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![newer_high.id, older_high.id, low.id]);

    let all = repo.list(SectionFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn update_section_is_partial_and_keeps_tenant() {
    let (db, t1, t2) = setup().await;
    let repo = SurrealSectionRepository::new(db);

    let section = repo
        .create(CreateSection {
            description: Some("Past roles".into()),
            ..section_input(t1, "Experience", Some(1))
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            Some(t1),
            section.id,
            UpdateSection {
                order: Some(3),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.order, 3);
    assert_eq!(updated.description, None);
    assert_eq!(updated.name, "Experience");
    assert_eq!(updated.tenant_id, t1);
    assert!(updated.updated_at >= section.updated_at);

    let err = repo
        .update(Some(t2), section.id, UpdateSection::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn datagrid_under_foreign_section_is_scope_mismatch() {
    let (db, t1, t2) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db);

    let section = sections
        .create(section_input(t1, "Experience", None))
        .await
        .unwrap();

    let err = datagrids
        .create(datagrid_input(t2, section.id, "History"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatagridError::ScopeMismatch { .. }));

    let persisted = datagrids.list(DatagridFilter::default()).await.unwrap();
    assert!(persisted.is_empty(), "no datagrid may be persisted");
}

#[tokio::test]
async fn datagrid_under_missing_section_is_not_found() {
    let (db, t1, _) = setup().await;
    let datagrids = SurrealDatagridRepository::new(db);

    let err = datagrids
        .create(datagrid_input(t1, Uuid::new_v4(), "History"))
        .await
        .unwrap_err();
    match err {
        DatagridError::NotFound { entity, .. } => assert_eq!(entity, "section"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn datagrid_crud_and_filters() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db);

    let experience = sections
        .create(section_input(t1, "Experience", None))
        .await
        .unwrap();
    let education = sections
        .create(section_input(t1, "Education", None))
        .await
        .unwrap();

    let history = datagrids
        .create(datagrid_input(t1, experience.id, "History"))
        .await
        .unwrap();
    datagrids
        .create(datagrid_input(t1, education.id, "Degrees"))
        .await
        .unwrap();

    assert_eq!(history.section_id, experience.id);
    assert_eq!(history.schema_version, 0);

    let in_experience = datagrids
        .list(DatagridFilter {
            tenant_id: Some(t1),
            section_id: Some(experience.id),
        })
        .await
        .unwrap();
    assert_eq!(in_experience.len(), 1);
    assert_eq!(in_experience[0].id, history.id);

    let renamed = datagrids
        .update(
            None,
            history.id,
            UpdateDatagrid {
                name: Some("Career".into()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Career");
    assert!(!renamed.is_active);
    assert_eq!(renamed.section_id, experience.id);

    datagrids.delete(Some(t1), history.id).await.unwrap();
    assert!(
        datagrids
            .get_by_id(None, history.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn column_key_is_unique_across_tenants() {
    let (db, t1, t2) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let s1 = sections.create(section_input(t1, "A", None)).await.unwrap();
    let s2 = sections.create(section_input(t2, "B", None)).await.unwrap();
    let g1 = datagrids
        .create(datagrid_input(t1, s1.id, "G1"))
        .await
        .unwrap();
    let g2 = datagrids
        .create(datagrid_input(t2, s2.id, "G2"))
        .await
        .unwrap();

    columns.create(column_input(t1, g1.id, "team")).await.unwrap();

    let err = columns
        .create(column_input(t2, g2.id, "team"))
        .await
        .unwrap_err();
    match err {
        DatagridError::DuplicateKey { key } => assert_eq!(key, "team"),
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
}

#[tokio::test]
async fn column_under_foreign_datagrid_is_scope_mismatch() {
    let (db, t1, t2) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();

    let err = columns
        .create(column_input(t2, grid.id, "team"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatagridError::ScopeMismatch { .. }));
}

#[tokio::test]
async fn malformed_column_definitions_are_invalid_input() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();

    let bad_pattern = CreateColumn {
        validation_rules: Some(json!({ "pattern": "([a-z" })),
        ..column_input(t1, grid.id, "code")
    };
    assert!(matches!(
        columns.create(bad_pattern).await.unwrap_err(),
        DatagridError::InvalidInput { .. }
    ));

    let bad_options = CreateColumn {
        column_type: ColumnType::Select,
        config: Some(json!({ "options": "red,green" })),
        ..column_input(t1, grid.id, "color")
    };
    assert!(matches!(
        columns.create(bad_options).await.unwrap_err(),
        DatagridError::InvalidInput { .. }
    ));

    // Nothing was written, so the schema did not move.
    let grid = datagrids.get_by_id(None, grid.id).await.unwrap();
    assert_eq!(grid.schema_version, 0);
}

#[tokio::test]
async fn column_writes_bump_schema_version() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();

    let column = columns.create(column_input(t1, grid.id, "team")).await.unwrap();
    assert_eq!(
        datagrids.get_by_id(None, grid.id).await.unwrap().schema_version,
        1
    );

    columns
        .update(
            Some(t1),
            column.id,
            UpdateColumn {
                required: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        datagrids.get_by_id(None, grid.id).await.unwrap().schema_version,
        2
    );

    columns.delete(Some(t1), column.id).await.unwrap();
    assert_eq!(
        datagrids.get_by_id(None, grid.id).await.unwrap().schema_version,
        3
    );
}

#[tokio::test]
async fn update_column_merges_definition() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();
    let column = columns
        .create(CreateColumn {
            column_type: ColumnType::Number,
            validation_rules: Some(json!({ "min": 0, "max": 120 })),
            ..column_input(t1, grid.id, "age")
        })
        .await
        .unwrap();

    // Switching to a date makes the numeric bounds meaningless.
    let err = columns
        .update(
            None,
            column.id,
            UpdateColumn {
                column_type: Some(ColumnType::Date),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatagridError::InvalidInput { .. }));

    let updated = columns
        .update(
            None,
            column.id,
            UpdateColumn {
                column_type: Some(ColumnType::Date),
                validation_rules: Some(None),
                label: Some("Birthday".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.column_type, ColumnType::Date);
    assert_eq!(updated.validation_rules, None);
    assert_eq!(updated.label, "Birthday");
    assert_eq!(updated.key, "age");
}

#[tokio::test]
async fn null_rules_and_config_are_stored_as_absent() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();

    let column = columns
        .create(CreateColumn {
            validation_rules: Some(json!(null)),
            config: Some(json!(null)),
            ..column_input(t1, grid.id, "nickname")
        })
        .await
        .unwrap();
    assert_eq!(column.validation_rules, None);
    assert_eq!(column.config, None);

    let column = columns
        .update(
            None,
            column.id,
            UpdateColumn {
                validation_rules: Some(Some(json!({ "maxLength": 20 }))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(column.validation_rules, Some(json!({ "maxLength": 20 })));

    let column = columns
        .update(
            None,
            column.id,
            UpdateColumn {
                validation_rules: Some(Some(json!(null))),
                config: Some(Some(json!(null))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(column.validation_rules, None);
    assert_eq!(column.config, None);
}

#[tokio::test]
async fn renaming_column_key_respects_global_uniqueness() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();
    columns.create(column_input(t1, grid.id, "team")).await.unwrap();
    let role = columns.create(column_input(t1, grid.id, "role")).await.unwrap();

    let err = columns
        .update(
            None,
            role.id,
            UpdateColumn {
                key: Some("team".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatagridError::DuplicateKey { .. }));

    // Re-submitting its own key is fine.
    columns
        .update(
            None,
            role.id,
            UpdateColumn {
                key: Some("role".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn columns_list_by_datagrid_in_display_order() {
    let (db, t1, _) = setup().await;
    let sections = SurrealSectionRepository::new(db.clone());
    let datagrids = SurrealDatagridRepository::new(db.clone());
    let columns = SurrealColumnRepository::new(db);

    let section = sections.create(section_input(t1, "A", None)).await.unwrap();
    let grid = datagrids
        .create(datagrid_input(t1, section.id, "G"))
        .await
        .unwrap();
    let other = datagrids
        .create(datagrid_input(t1, section.id, "Other"))
        .await
        .unwrap();

    let first = columns
        .create(CreateColumn {
            order: Some(1),
            ..column_input(t1, grid.id, "first")
        })
        .await
        .unwrap();
    let second = columns
        .create(CreateColumn {
            order: Some(2),
            ..column_input(t1, grid.id, "second")
        })
        .await
        .unwrap();
    columns.create(column_input(t1, other.id, "elsewhere")).await.unwrap();

    let keys: Vec<Uuid> = columns
        .list(ColumnFilter {
            tenant_id: Some(t1),
            datagrid_id: Some(grid.id),
        })
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(keys, vec![second.id, first.id]);
}
