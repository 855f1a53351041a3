//! Identity and tenant scoping checks.
//!
//! Every creation path validates the identifiers it was handed and
//! confirms that a child entity's tenant agrees with its parent's
//! before anything is written.

use uuid::{Uuid, Variant};

use crate::error::{DatagridError, DatagridResult};

/// Length of the canonical hyphenated textual form.
const CANONICAL_LEN: usize = 36;

/// Raised when a child entity's tenant disagrees with its parent's.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("{entity} belongs to tenant {parent_tenant_id}, not {child_tenant_id}")]
    TenantMismatch {
        entity: &'static str,
        parent_tenant_id: Uuid,
        child_tenant_id: Uuid,
    },
}

/// Generate a fresh entity identifier.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Returns true only for canonical, hyphenated RFC 4122 identifiers
/// (version 1 through 5). Case-insensitive.
pub fn validate_id(candidate: &str) -> bool {
    if candidate.len() != CANONICAL_LEN {
        return false;
    }
    let bytes = candidate.as_bytes();
    if [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
        return false;
    }
    match Uuid::try_parse(candidate) {
        Ok(id) => is_well_formed(&id),
        Err(_) => false,
    }
}

/// Parse untrusted text into an identifier.
pub fn parse_id(entity: &str, candidate: &str) -> DatagridResult<Uuid> {
    if !validate_id(candidate) {
        return Err(DatagridError::invalid_input(format!(
            "{entity} id is not a valid UUID: {candidate:?}"
        )));
    }
    Uuid::try_parse(candidate)
        .map_err(|e| DatagridError::invalid_input(format!("{entity} id: {e}")))
}

/// Reject identifiers that would not survive [`validate_id`], such as
/// the nil UUID or unknown versions.
pub fn ensure_valid_id(entity: &str, id: Uuid) -> DatagridResult<()> {
    if is_well_formed(&id) {
        Ok(())
    } else {
        Err(DatagridError::invalid_input(format!(
            "{entity} id is not a valid UUID: {id}"
        )))
    }
}

/// Fails with [`ScopeError::TenantMismatch`] when the tenants differ.
pub fn assert_same_tenant(
    entity: &'static str,
    parent_tenant_id: Uuid,
    child_tenant_id: Uuid,
) -> Result<(), ScopeError> {
    if parent_tenant_id == child_tenant_id {
        Ok(())
    } else {
        Err(ScopeError::TenantMismatch {
            entity,
            parent_tenant_id,
            child_tenant_id,
        })
    }
}

fn is_well_formed(id: &Uuid) -> bool {
    id.get_variant() == Variant::RFC4122 && (1..=5).contains(&id.get_version_num())
}
