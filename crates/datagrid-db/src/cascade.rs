//! Cascade & integrity controller.
//!
//! Deleting a tenant, section, datagrid or user removes everything it
//! owns in a single transaction. Descendants are removed before their
//! parents, so a concurrent reader never sees a child whose owner is
//! already gone. If any statement fails the whole deletion rolls back.

use std::fmt;

use surrealdb::{Connection, Surreal};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;

/// The entity whose deletion starts a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeRoot {
    Tenant(Uuid),
    Section(Uuid),
    Datagrid(Uuid),
    /// Users own the rows they authored.
    User(Uuid),
}

impl CascadeRoot {
    pub fn entity(&self) -> &'static str {
        match self {
            CascadeRoot::Tenant(_) => "tenant",
            CascadeRoot::Section(_) => "section",
            CascadeRoot::Datagrid(_) => "datagrid",
            CascadeRoot::User(_) => "user",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            CascadeRoot::Tenant(id)
            | CascadeRoot::Section(id)
            | CascadeRoot::Datagrid(id)
            | CascadeRoot::User(id) => *id,
        }
    }

    /// Delete statements in execution order. `$id` is the root's id.
    pub fn plan(&self) -> &'static [&'static str] {
        match self {
            CascadeRoot::Tenant(_) => &[
                "DELETE datagrid_row WHERE tenant_id = $id",
                "DELETE datagrid_column WHERE tenant_id = $id",
                "DELETE datagrid WHERE tenant_id = $id",
                "DELETE section WHERE tenant_id = $id",
                "DELETE user WHERE tenant_id = $id",
                "DELETE type::record('tenant', $id)",
            ],
            CascadeRoot::Section(_) => &[
                "LET $grids = (SELECT VALUE meta::id(id) FROM datagrid WHERE section_id = $id)",
                "DELETE datagrid_row WHERE datagrid_id IN $grids",
                "DELETE datagrid_column WHERE datagrid_id IN $grids",
                "DELETE datagrid WHERE section_id = $id",
                "DELETE type::record('section', $id)",
            ],
            CascadeRoot::Datagrid(_) => &[
                "DELETE datagrid_row WHERE datagrid_id = $id",
                "DELETE datagrid_column WHERE datagrid_id = $id",
                "DELETE type::record('datagrid', $id)",
            ],
            CascadeRoot::User(_) => &[
                "DELETE datagrid_row WHERE user_id = $id",
                "DELETE type::record('user', $id)",
            ],
        }
    }

    /// The plan wrapped in a transaction.
    pub fn script(&self) -> String {
        let mut script = String::from("BEGIN TRANSACTION;\n");
        for statement in self.plan() {
            script.push_str(statement);
            script.push_str(";\n");
        }
        script.push_str("COMMIT TRANSACTION;");
        script
    }
}

impl fmt::Display for CascadeRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity(), self.id())
    }
}

/// Run the cascade for `root`. Existence and tenant checks are the
/// caller's responsibility.
pub async fn cascade_delete<C: Connection>(
    db: &Surreal<C>,
    root: CascadeRoot,
) -> Result<(), DbError> {
    debug!(entity = root.entity(), id = %root.id(), steps = root.plan().len(), "Cascade plan");

    let response = db
        .query(root.script())
        .bind(("id", root.id().to_string()))
        .await?;

    if let Err(e) = response.check() {
        warn!(entity = root.entity(), id = %root.id(), error = %e, "Cascade rolled back");
        return Err(DbError::Integrity(format!(
            "cascade delete of {root} rolled back: {e}"
        )));
    }

    info!(entity = root.entity(), id = %root.id(), "Cascade delete committed");
    Ok(())
}
