//! Datagrid Database: SurrealDB connection management, schema
//! migrations and repository implementations for the datagrid
//! hierarchy.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Transactional cascading deletes ([`cascade`])
//! - Implementations of the `datagrid-core` repository traits
//!   ([`repository`])
//! - Error types ([`DbError`])

pub mod cascade;
mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
