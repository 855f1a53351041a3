//! Datagrid domain model.
//!
//! A datagrid is a user-defined table inside a section. Its shape is
//! described by its columns; its data is the rows users write into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datagrid {
    pub id: Uuid,
    /// Always equal to the owning section's tenant.
    pub tenant_id: Uuid,
    /// Write-once.
    pub section_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub is_active: bool,
    /// Incremented whenever a column under this datagrid is created,
    /// updated or deleted. Row writes are guarded on it.
    pub schema_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatagrid {
    pub tenant_id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDatagrid {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Optional filters for listing datagrids. Both filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct DatagridFilter {
    pub tenant_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}
