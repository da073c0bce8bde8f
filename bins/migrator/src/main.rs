//! Database migration runner for the leave ledger schema.
//!
//! Usage:
//!   migrator [up]    - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop everything and re-apply
//!
//! The database URL comes from `DATABASE_URL`, falling back to the
//! `database.url` of the application configuration.

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kawani_db::migration::Migrator;
use kawani_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kawani=info,sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            AppConfig::load()
                .context("DATABASE_URL is not set and no configuration was found")?
                .database
                .url
        }
    };
    let db = kawani_db::connect(&url).await?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "fresh" => Migrator::fresh(&db).await?,
        "status" => {
            for migration in Migrator::get_applied_migrations(&db).await? {
                info!(name = migration.name(), "applied");
            }
            for migration in Migrator::get_pending_migrations(&db).await? {
                info!(name = migration.name(), "pending");
            }
        }
        other => bail!("unknown command `{other}`; expected up, down, status or fresh"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
