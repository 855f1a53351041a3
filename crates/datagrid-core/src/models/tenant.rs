//! Tenant domain model.
//!
//! Tenants are the root of the hierarchy and the isolation boundary:
//! every section, datagrid, column, row and user belongs to exactly one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated customer of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL prefix (e.g. `acme` in `https://acme.example.com`). Unique
    /// across all tenants.
    pub subdomain: String,
    /// Optional custom domain.
    pub domain: Option<String>,
    /// Inactive tenants still accept new sections.
    pub is_active: bool,
    /// Tenant-specific settings (theme, branding, ...).
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub subdomain: String,
    pub domain: Option<String>,
    pub settings: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub subdomain: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub domain: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub settings: Option<serde_json::Value>,
}
