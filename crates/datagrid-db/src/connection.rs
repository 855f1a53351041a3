//! SurrealDB connection management.
//!
//! The endpoint scheme picks the engine: `mem://` opens an embedded
//! in-memory store (demos, local tries of the seed data), anything else
//! is a remote server reached over WebSocket.

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

const MEMORY_SCHEME: &str = "mem://";

/// Where and as whom to connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// `host:port` of a server, a full `ws://`/`wss://` URL, or `mem://`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials; ignored by the in-memory engine.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "datagrid".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Settings for an embedded in-memory store.
    pub fn in_memory() -> Self {
        Self {
            url: MEMORY_SCHEME.into(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with(MEMORY_SCHEME)
    }

    /// The configured address with a scheme; bare `host:port` means
    /// WebSocket.
    pub fn endpoint(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("ws://{}", self.url)
        }
    }
}

/// Owns the SurrealDB handle shared by the repositories.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Open the configured endpoint, sign in as root when talking to a
    /// server, and select namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        let endpoint = config.endpoint();
        info!(
            endpoint = %endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(endpoint).await?;
        if config.is_in_memory() {
            debug!("In-memory engine, skipping sign-in");
        } else {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        Self::connect_with(db, config).await
    }

    /// Adopt an already opened handle and select the configured
    /// namespace and database on it.
    pub async fn connect_with(db: Surreal<Any>, config: &DbConfig) -> Result<Self, surrealdb::Error> {
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        info!(namespace = %config.namespace, database = %config.database, "SurrealDB ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}
