mod common;
mod config;
mod routes;

mod greenhouses;
mod growing_cycles;
mod harvests;
mod inventory;
mod maintenance;
mod users;

#[cfg(test)]
mod test_helpers;

use crate::config::Config;
use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing/logging
    tracing_subscriber::fmt::init();

    // Load configuration and environment variables to pass to the application
    let config: Config = Config::from_env()?;

    let db: DatabaseConnection = Database::connect(config.db_url.as_str())
        .await
        .context("Could not connect to the database")?;
    tracing::info!("Connected to the database");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("DB migrations complete");

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );
    if !config.require_auth {
        tracing::warn!("REQUIRE_AUTH is off: every route is open");
    }

    let router = routes::build_router(&db, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Could not bind {}", config.bind_address))?;
    tracing::info!("Listening on {}", config.bind_address);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
