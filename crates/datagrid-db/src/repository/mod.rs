//! SurrealDB implementations of the core repository traits.

pub mod column;
pub mod datagrid;
pub mod row;
pub mod section;
mod support;
pub mod tenant;
pub mod user;

pub use column::SurrealColumnRepository;
pub use datagrid::SurrealDatagridRepository;
pub use row::SurrealRowRepository;
pub use section::SurrealSectionRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;
