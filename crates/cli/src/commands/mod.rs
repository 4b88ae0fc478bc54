//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use sqlx::SqlitePool;
use thiserror::Error;

use shoplite_api::config::{ApiConfig, ConfigError};

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by the environment.
pub async fn connect() -> Result<SqlitePool, CommandError> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = shoplite_api::db::create_pool(&config.database_url).await?;

    Ok(pool)
}
