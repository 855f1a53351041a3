//! User section view: one section, its datagrids with their column
//! schema, and only the rows authored by one user.

use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::models::column::ColumnFilter;
use datagrid_core::models::datagrid::DatagridFilter;
use datagrid_core::models::row::RowFilter;
use datagrid_core::models::view::{DatagridView, SectionView, UserSectionView};
use datagrid_core::repository::{
    ColumnRepository, DatagridRepository, RowRepository, SectionRepository, UserRepository,
};
use tracing::debug;
use uuid::Uuid;

/// Read-side service assembling [`UserSectionView`]s.
///
/// Generic over repository implementations so that the query layer
/// has no dependency on the database crate.
pub struct SectionViewService<U, S, D, C, R>
where
    U: UserRepository,
    S: SectionRepository,
    D: DatagridRepository,
    C: ColumnRepository,
    R: RowRepository,
{
    user_repo: U,
    section_repo: S,
    datagrid_repo: D,
    column_repo: C,
    row_repo: R,
}

impl<U, S, D, C, R> SectionViewService<U, S, D, C, R>
where
    U: UserRepository,
    S: SectionRepository,
    D: DatagridRepository,
    C: ColumnRepository,
    R: RowRepository,
{
    pub fn new(user_repo: U, section_repo: S, datagrid_repo: D, column_repo: C, row_repo: R) -> Self {
        Self {
            user_repo,
            section_repo,
            datagrid_repo,
            column_repo,
            row_repo,
        }
    }

    /// Build the view of `section_id` for `user_id`.
    ///
    /// When `tenant_id` is given both lookups are restricted to it.
    /// Fails with `NotFound` naming `section` or `user`. Every nested
    /// collection is ordered by descending `order`, newest first on
    /// ties.
    pub async fn user_section_view(
        &self,
        tenant_id: Option<Uuid>,
        user_id: Uuid,
        section_id: Uuid,
    ) -> DatagridResult<UserSectionView> {
        let section = self
            .section_repo
            .get_by_id(tenant_id, section_id)
            .await
            .map_err(|e| relabel(e, "section", section_id))?;
        let user = self
            .user_repo
            .get_by_id(tenant_id, user_id)
            .await
            .map_err(|e| relabel(e, "user", user_id))?;

        let datagrids = self
            .datagrid_repo
            .list(DatagridFilter {
                tenant_id: Some(section.tenant_id),
                section_id: Some(section.id),
            })
            .await?;

        let mut views = Vec::with_capacity(datagrids.len());
        for datagrid in datagrids {
            let columns = self
                .column_repo
                .list(ColumnFilter {
                    tenant_id: Some(datagrid.tenant_id),
                    datagrid_id: Some(datagrid.id),
                })
                .await?;
            let rows = self
                .row_repo
                .list(RowFilter {
                    tenant_id: Some(datagrid.tenant_id),
                    datagrid_id: Some(datagrid.id),
                    user_id: Some(user.id),
                })
                .await?;
            views.push(DatagridView::assemble(datagrid, columns, rows));
        }

        debug!(
            section_id = %section.id,
            user_id = %user.id,
            datagrids = views.len(),
            "Assembled user section view"
        );

        Ok(UserSectionView {
            user: user.into(),
            section: SectionView::assemble(section, views),
        })
    }
}

/// Any not-found during a lookup is reported against the entity the
/// caller asked for.
fn relabel(err: DatagridError, entity: &str, id: Uuid) -> DatagridError {
    if err.is_not_found() {
        DatagridError::not_found(entity, id)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relabel_only_touches_not_found() {
        let id = Uuid::new_v4();
        let err = relabel(DatagridError::not_found("row", "x"), "user", id);
        match err {
            DatagridError::NotFound { entity, id: got } => {
                assert_eq!(entity, "user");
                assert_eq!(got, id.to_string());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }

        let err = relabel(DatagridError::Database("down".into()), "user", id);
        assert!(matches!(err, DatagridError::Database(_)));
    }
}
