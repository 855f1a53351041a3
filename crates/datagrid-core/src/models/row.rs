//! Row domain model.
//!
//! A row is one user's record in a datagrid. Its `data` maps column keys
//! to values; the shape is checked by the schema engine at write time
//! but storage does not enforce it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row payload: column key → value.
pub type RowData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: Uuid,
    /// Always equal to the owning datagrid's tenant.
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    /// Write-once.
    pub datagrid_id: Uuid,
    pub data: RowData,
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRow {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub datagrid_id: Uuid,
    pub data: RowData,
    /// Defaults to `0`.
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRow {
    /// Replaces the whole payload; re-validated against the current schema.
    pub data: Option<RowData>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Optional filters for listing rows. All filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub tenant_id: Option<Uuid>,
    pub datagrid_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}
