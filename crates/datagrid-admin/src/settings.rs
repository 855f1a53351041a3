//! Layered configuration for the admin binary.
//!
//! Sources, later ones overriding earlier ones:
//! - built-in defaults
//! - `datagrid.toml` in the working directory, or the file given with
//!   `--config`
//! - environment variables prefixed with `DATAGRID__`, e.g.
//!   `DATAGRID__DATABASE__URL=db:8000` or `DATAGRID__SCHEMA__MODE=strict`

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use datagrid_core::schema::SchemaConfig;
use datagrid_db::DbConfig;
use serde::Deserialize;

const DEFAULT_FILE: &str = "datagrid";
const ENV_PREFIX: &str = "DATAGRID";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub schema: SchemaConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "datagrid=info".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; the default
    /// file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        Self::from_builder(Config::builder().add_source(file))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
