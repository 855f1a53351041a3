//! Datagrid Query: hierarchical read projections.
//!
//! The services here only read. They are generic over the
//! `datagrid-core` repository traits, so this crate has no dependency
//! on any storage backend.

pub mod service;

pub use service::SectionViewService;
