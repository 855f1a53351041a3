//! Datagrid Admin: operator entry point.
//!
//! Applies schema migrations, loads demo data and prints user section
//! views against a SurrealDB instance.

mod seed;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datagrid_core::identity::parse_id;
use datagrid_db::repository::{
    SurrealColumnRepository, SurrealDatagridRepository, SurrealRowRepository,
    SurrealSectionRepository, SurrealUserRepository,
};
use datagrid_db::{DbManager, run_migrations};
use datagrid_query::SectionViewService;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::{AppConfig, LogConfig, LogFormat};

#[derive(Parser)]
#[command(name = "datagrid-admin", version, about)]
struct Cli {
    /// Configuration file (defaults to `datagrid.toml` if present).
    #[arg(short, long, global = true, env = "DATAGRID_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Apply migrations, then load the demo tenants and data.
    Seed,
    /// Print a user's view of a section as JSON.
    View {
        #[arg(long)]
        tenant: Option<String>,
        #[arg(long)]
        user: String,
        #[arg(long)]
        section: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let app_config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&app_config.log);

    let manager = DbManager::connect(&app_config.database)
        .await
        .context("connecting to SurrealDB")?;
    let db = manager.client();

    match cli.command {
        Command::Migrate => {
            run_migrations(db).await.context("running migrations")?;
            info!("Migrations complete");
        }
        Command::Seed => {
            run_migrations(db).await.context("running migrations")?;
            let summary = seed::seed(db, &app_config.schema).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::View {
            tenant,
            user,
            section,
        } => {
            let tenant_id = tenant.as_deref().map(|t| parse_id("tenant", t)).transpose()?;
            let user_id = parse_id("user", &user)?;
            let section_id = parse_id("section", &section)?;

            let service = SectionViewService::new(
                SurrealUserRepository::new(db.clone()),
                SurrealSectionRepository::new(db.clone()),
                SurrealDatagridRepository::new(db.clone()),
                SurrealColumnRepository::new(db.clone()),
                SurrealRowRepository::new(db.clone()),
            );
            let view = service
                .user_section_view(tenant_id, user_id, section_id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
