//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use datagrid_core::error::{DatagridError, DatagridResult};
use datagrid_core::identity::{assert_same_tenant, ensure_valid_id, new_id};
use datagrid_core::models::user::{CreateUser, UpdateUser, User};
use datagrid_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::support::{Conditions, parse_uuid, require_text};
use crate::cascade::{CascadeRoot, cascade_delete};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRecord {
    record_id: String,
    tenant_id: String,
    email: String,
    first_name: String,
    last_name: String,
    profile_image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn try_into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid("user", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Look up a user, optionally restricted to one tenant.
pub(crate) async fn find<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Option<Uuid>,
    id: Uuid,
) -> Result<Option<User>, DbError> {
    let conditions = Conditions::new().eq("tenant_id", tenant_id);
    let query = format!(
        "SELECT meta::id(id) AS record_id, * FROM type::record('user', $id){}",
        conditions.where_clause()
    );
    let mut builder = db.query(query).bind(("id", id.to_string()));
    for bind in conditions.into_binds() {
        builder = builder.bind(bind);
    }
    let mut result = builder.await?;
    let rows: Vec<UserRecord> = result.take(0)?;
    rows.into_iter().next().map(UserRecord::try_into_user).transpose()
}

async fn email_taken<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Uuid,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, DbError> {
    let mut result = db
        .query(
            "SELECT VALUE meta::id(id) FROM user \
             WHERE tenant_id = $tenant_id AND email = $email",
        )
        .bind(("tenant_id", tenant_id.to_string()))
        .bind(("email", email.to_string()))
        .await?;
    let ids: Vec<String> = result.take(0)?;
    let except = except.map(|id| id.to_string());
    Ok(ids.iter().any(|id| Some(id) != except.as_ref()))
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn diagnose_write(
        &self,
        tenant_id: Uuid,
        email: &str,
        own_id: Uuid,
        err: String,
    ) -> DatagridError {
        match email_taken(&self.db, tenant_id, email, Some(own_id)).await {
            Ok(true) => DatagridError::AlreadyExists {
                entity: "user".into(),
            },
            _ => DbError::Query(err).into(),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> DatagridResult<User> {
        ensure_valid_id("tenant", input.tenant_id)?;
        require_text("email", &input.email)?;

        let tenant = super::tenant::find(&self.db, input.tenant_id)
            .await?
            .ok_or_else(|| DatagridError::not_found("tenant", input.tenant_id))?;
        assert_same_tenant("tenant", tenant.id, input.tenant_id)?;

        if email_taken(&self.db, input.tenant_id, &input.email, None).await? {
            return Err(DatagridError::AlreadyExists {
                entity: "user".into(),
            });
        }

        let id = new_id();
        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, email = $email, \
                 first_name = $first_name, last_name = $last_name, \
                 profile_image_url = $profile_image_url",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("email", input.email.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("profile_image_url", input.profile_image_url))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            return Err(self
                .diagnose_write(input.tenant_id, &input.email, id, e.to_string())
                .await);
        }

        info!(tenant_id = %input.tenant_id, user_id = %id, "User created");
        self.get_by_id(None, id).await
    }

    async fn get_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<User> {
        find(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| DatagridError::not_found("user", id))
    }

    async fn update(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
        input: UpdateUser,
    ) -> DatagridResult<User> {
        let current = self.get_by_id(tenant_id, id).await?;

        if let Some(email) = &input.email {
            require_text("email", email)?;
            if email_taken(&self.db, current.tenant_id, email, Some(id)).await? {
                return Err(DatagridError::AlreadyExists {
                    entity: "user".into(),
                });
            }
        }

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.profile_image_url.is_some() {
            sets.push("profile_image_url = $profile_image_url");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));
        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        let new_email = input.email.clone();
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(profile_image_url) = input.profile_image_url {
            builder = builder.bind(("profile_image_url", profile_image_url));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        if let Err(e) = result.check() {
            return Err(match new_email {
                Some(email) => {
                    self.diagnose_write(current.tenant_id, &email, id, e.to_string())
                        .await
                }
                None => DbError::Query(e.to_string()).into(),
            });
        }

        debug!(user_id = %id, "User updated");
        self.get_by_id(None, id).await
    }

    async fn delete(&self, tenant_id: Option<Uuid>, id: Uuid) -> DatagridResult<()> {
        self.get_by_id(tenant_id, id).await?;
        cascade_delete(&self.db, CascadeRoot::User(id)).await?;
        Ok(())
    }

    async fn list(&self, tenant_id: Uuid) -> DatagridResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRecord> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(UserRecord::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(users)
    }
}
