//! Error types for the datagrid system.

use thiserror::Error;

use crate::identity::ScopeError;
use crate::schema::FieldError;

#[derive(Debug, Error)]
pub enum DatagridError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Tenant scope mismatch on {entity}: expected tenant {expected}, got {actual}")]
    ScopeMismatch {
        entity: String,
        expected: String,
        actual: String,
    },

    #[error("Row payload violates schema: {}", summarize(errors))]
    Validation { errors: Vec<FieldError> },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Column key already in use: {key}")]
    DuplicateKey { key: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DatagridError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// True for every `NotFound`, regardless of the entity kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ScopeError> for DatagridError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::TenantMismatch {
                entity,
                parent_tenant_id,
                child_tenant_id,
            } => Self::ScopeMismatch {
                entity: entity.into(),
                expected: parent_tenant_id.to_string(),
                actual: child_tenant_id.to_string(),
            },
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type DatagridResult<T> = Result<T, DatagridError>;
