//! Database migration command.
//!
//! Applies the embedded schema migrations. The tower-sessions table is
//! owned by the session store and migrated by the API server at startup.

use super::CommandError;

/// Run the schema migrations.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    shoplite_api::db::MIGRATOR
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    tracing::info!("Migrations complete");
    Ok(())
}
