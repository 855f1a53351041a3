//! Datagrid Core: shared domain types for tenant-defined datagrids.
//!
//! This crate provides:
//! - The entity models of the tenant → section → datagrid → column/row
//!   hierarchy ([`models`])
//! - The caller-facing error taxonomy ([`error`])
//! - Identifier validation and tenant scoping checks ([`identity`])
//! - The schema engine that validates row payloads against a
//!   datagrid's columns ([`schema`])
//! - Repository trait contracts implemented by storage crates
//!   ([`repository`])

pub mod error;
pub mod identity;
pub mod models;
pub mod repository;
pub mod schema;

pub use error::{DatagridError, DatagridResult};
