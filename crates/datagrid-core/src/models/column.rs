//! Column domain model.
//!
//! A column is one field definition of a datagrid's rows: its key in
//! the row payload, display label, type, whether it is required, and
//! free-form validation rules and configuration interpreted by the
//! schema engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Email,
    Url,
    Date,
    Datetime,
    Boolean,
    Select,
    Textarea,
}

impl ColumnType {
    pub const ALL: [ColumnType; 9] = [
        ColumnType::Text,
        ColumnType::Number,
        ColumnType::Email,
        ColumnType::Url,
        ColumnType::Date,
        ColumnType::Datetime,
        ColumnType::Boolean,
        ColumnType::Select,
        ColumnType::Textarea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Email => "email",
            ColumnType::Url => "url",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Select => "select",
            ColumnType::Textarea => "textarea",
        }
    }

    /// Types whose values are free strings (length and pattern rules
    /// apply to the text itself).
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ColumnType::Text | ColumnType::Textarea | ColumnType::Email | ColumnType::Url
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown column type: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    /// Always equal to the owning datagrid's tenant.
    pub tenant_id: Uuid,
    /// Write-once.
    pub datagrid_id: Uuid,
    /// Key of this field inside row payloads. Unique across every
    /// column in the system, not only within the datagrid.
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub required: bool,
    pub order: i32,
    /// Extra predicates, e.g. `{"min": 0, "max": 10, "pattern": "^[A-Z]"}`.
    pub validation_rules: Option<serde_json::Value>,
    /// Type-specific configuration, e.g. `{"options": ["a", "b"]}`.
    pub config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateColumn {
    pub tenant_id: Uuid,
    pub datagrid_id: Uuid,
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Defaults to `false`.
    pub required: Option<bool>,
    /// Defaults to `0`.
    pub order: Option<i32>,
    pub validation_rules: Option<serde_json::Value>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateColumn {
    pub key: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
    pub required: Option<bool>,
    pub order: Option<i32>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub validation_rules: Option<Option<serde_json::Value>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub config: Option<Option<serde_json::Value>>,
}

/// Optional filters for listing columns. Both filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    pub tenant_id: Option<Uuid>,
    pub datagrid_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_round_trips_through_str() {
        for t in ColumnType::ALL {
            assert_eq!(t.as_str().parse::<ColumnType>().unwrap(), t);
        }
        assert!("varchar".parse::<ColumnType>().is_err());
    }

    #[test]
    fn column_type_serializes_lowercase() {
        let json = serde_json::to_string(&ColumnType::Datetime).unwrap();
        assert_eq!(json, "\"datetime\"");
    }
}
