//! Section domain model.
//!
//! A section is a named grouping of datagrids within a tenant, such as
//! "Experience" or "Achievements" on a profile page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    /// Write-once.
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Display position. Higher values list first; not unique.
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSection {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `0`.
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSection {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Optional filters for listing sections.
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    pub tenant_id: Option<Uuid>,
}
