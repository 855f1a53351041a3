//! Small helpers shared by the repository implementations.

use datagrid_core::error::{DatagridError, DatagridResult};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DbError;

/// Ordering applied to every list query.
pub(crate) const DISPLAY_ORDER: &str = "ORDER BY sort_order DESC, created_at DESC";

pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn to_order(raw: i64) -> Result<i32, DbError> {
    i32::try_from(raw).map_err(|_| DbError::Decode(format!("sort_order out of range: {raw}")))
}

pub(crate) fn require_text(field: &str, value: &str) -> DatagridResult<()> {
    if value.trim().is_empty() {
        Err(DatagridError::invalid_input(format!("{field} must not be blank")))
    } else {
        Ok(())
    }
}

/// JSON `null` in an optional object field means "absent"; storage
/// only accepts NONE there.
pub(crate) fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// `None` and `null` both mean "not given"; anything else must be a
/// JSON object.
pub(crate) fn optional_object(field: &str, value: Option<Value>) -> DatagridResult<Option<Value>> {
    match non_null(value) {
        Some(value) if !value.is_object() => Err(DatagridError::invalid_input(format!(
            "{field} must be an object"
        ))),
        value => Ok(value),
    }
}

/// Equality filters on string-encoded UUID fields, rendered as a
/// `WHERE` clause with one bound parameter per field.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    binds: Vec<(&'static str, String)>,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn eq(mut self, field: &'static str, value: Option<Uuid>) -> Self {
        if let Some(value) = value {
            self.binds.push((field, value.to_string()));
        }
        self
    }

    pub(crate) fn where_clause(&self) -> String {
        if self.binds.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .binds
            .iter()
            .map(|(field, _)| format!("{field} = ${field}"))
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    }

    pub(crate) fn into_binds(self) -> Vec<(&'static str, String)> {
        self.binds
    }
}
