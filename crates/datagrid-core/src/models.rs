//! Domain models for the datagrid hierarchy.
//!
//! Ownership runs tenant → section → datagrid → column/row. Users are
//! tenant-owned and own the rows they author.

pub mod column;
pub mod datagrid;
pub mod row;
pub mod section;
pub mod tenant;
pub mod user;
pub mod view;
