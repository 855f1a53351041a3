//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Reads and mutations of
//! tenant-owned entities accept an optional `tenant_id`; when supplied,
//! an entity owned by another tenant is reported as not found. Creation
//! inputs always carry the tenant explicitly and are checked against
//! the parent entity's tenant before anything is written.
//!
//! List operations return entities ordered by descending `order`, ties
//! broken by descending creation time.

use uuid::Uuid;

use crate::error::DatagridResult;
use crate::models::{
    column::{Column, ColumnFilter, CreateColumn, UpdateColumn},
    datagrid::{CreateDatagrid, Datagrid, DatagridFilter, UpdateDatagrid},
    row::{CreateRow, Row, RowFilter, UpdateRow},
    section::{CreateSection, Section, SectionFilter, UpdateSection},
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{CreateUser, UpdateUser, User},
};

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the subdomain is taken.
    fn create(&self, input: CreateTenant) -> impl Future<Output = DatagridResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DatagridResult<Tenant>> + Send;
    fn get_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = DatagridResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = DatagridResult<Tenant>> + Send;
    /// Removes the tenant and everything it owns in one transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = DatagridResult<()>> + Send;
    /// Ordered by creation time, oldest first.
    fn list(&self) -> impl Future<Output = DatagridResult<Vec<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-owned repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `NotFound` for an unknown tenant and `AlreadyExists`
    /// when the email is taken within the tenant.
    fn create(&self, input: CreateUser) -> impl Future<Output = DatagridResult<User>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<User>> + Send;
    fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = DatagridResult<User>> + Send;
    /// Removes the user and the rows they authored.
    fn delete(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<()>> + Send;
    /// Ordered by creation time, oldest first.
    fn list(&self, tenant_id: Uuid) -> impl Future<Output = DatagridResult<Vec<User>>> + Send;
}

pub trait SectionRepository: Send + Sync {
    /// Fails with `NotFound` when the tenant does not exist. The
    /// tenant's active flag is not consulted.
    fn create(&self, input: CreateSection)
    -> impl Future<Output = DatagridResult<Section>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<Section>> + Send;
    fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateSection,
    ) -> impl Future<Output = DatagridResult<Section>> + Send;
    /// Removes the section with all its datagrids, columns and rows.
    fn delete(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<()>> + Send;
    fn list(
        &self,
        filter: SectionFilter,
    ) -> impl Future<Output = DatagridResult<Vec<Section>>> + Send;
}

pub trait DatagridRepository: Send + Sync {
    /// Fails with `NotFound` when the section does not exist and
    /// `ScopeMismatch` when it belongs to another tenant.
    fn create(
        &self,
        input: CreateDatagrid,
    ) -> impl Future<Output = DatagridResult<Datagrid>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<Datagrid>> + Send;
    fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateDatagrid,
    ) -> impl Future<Output = DatagridResult<Datagrid>> + Send;
    /// Removes the datagrid with its columns and rows.
    fn delete(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<()>> + Send;
    fn list(
        &self,
        filter: DatagridFilter,
    ) -> impl Future<Output = DatagridResult<Vec<Datagrid>>> + Send;
}

pub trait ColumnRepository: Send + Sync {
    /// Fails with `NotFound` / `ScopeMismatch` for the parent datagrid,
    /// `InvalidInput` for malformed rules or config, and `DuplicateKey`
    /// when the key is used by any column in the system.
    fn create(&self, input: CreateColumn) -> impl Future<Output = DatagridResult<Column>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<Column>> + Send;
    fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateColumn,
    ) -> impl Future<Output = DatagridResult<Column>> + Send;
    /// Leaf delete. Row payloads that reference the key are left as-is.
    fn delete(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<()>> + Send;
    fn list(
        &self,
        filter: ColumnFilter,
    ) -> impl Future<Output = DatagridResult<Vec<Column>>> + Send;
}

pub trait RowRepository: Send + Sync {
    /// Fails with `NotFound` / `ScopeMismatch` for the datagrid or user,
    /// and `Validation` when the payload does not satisfy the schema.
    fn create(&self, input: CreateRow) -> impl Future<Output = DatagridResult<Row>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<Row>> + Send;
    /// A new payload is re-validated against the current schema.
    fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateRow,
    ) -> impl Future<Output = DatagridResult<Row>> + Send;
    fn delete(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> impl Future<Output = DatagridResult<()>> + Send;
    fn list(&self, filter: RowFilter) -> impl Future<Output = DatagridResult<Vec<Row>>> + Send;
}
