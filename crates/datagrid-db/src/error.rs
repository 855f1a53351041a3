//! Database-specific error types and conversions.

use datagrid_core::error::DatagridError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl From<DbError> for DatagridError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Integrity(msg) => DatagridError::Integrity(msg),
            other => DatagridError::Database(other.to_string()),
        }
    }
}
