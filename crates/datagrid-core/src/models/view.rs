//! Read-side projection of a section for one user.
//!
//! Returned by the user section view query: the section with every
//! datagrid in it, each carrying its columns as schema and only the
//! rows that belong to the requested user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::column::{Column, ColumnType};
use crate::models::datagrid::Datagrid;
use crate::models::row::{Row, RowData};
use crate::models::section::Section;
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSectionView {
    pub user: UserSummary,
    pub section: SectionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub datagrids: Vec<DatagridView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatagridView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub required: bool,
    pub order: i32,
    pub validation_rules: Option<serde_json::Value>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowView {
    pub id: Uuid,
    pub data: RowData,
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            profile_image_url: user.profile_image_url,
        }
    }
}

impl From<Column> for ColumnSchema {
    fn from(column: Column) -> Self {
        Self {
            key: column.key,
            label: column.label,
            column_type: column.column_type,
            required: column.required,
            order: column.order,
            validation_rules: column.validation_rules,
            config: column.config,
        }
    }
}

impl From<Row> for RowView {
    fn from(row: Row) -> Self {
        Self {
            id: row.id,
            data: row.data,
            order: row.order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl DatagridView {
    pub fn assemble(datagrid: Datagrid, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            id: datagrid.id,
            name: datagrid.name,
            description: datagrid.description,
            order: datagrid.order,
            columns: columns.into_iter().map(ColumnSchema::from).collect(),
            rows: rows.into_iter().map(RowView::from).collect(),
        }
    }
}

impl SectionView {
    pub fn assemble(section: Section, datagrids: Vec<DatagridView>) -> Self {
        Self {
            id: section.id,
            name: section.name,
            description: section.description,
            order: section.order,
            datagrids,
        }
    }
}
