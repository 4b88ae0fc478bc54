//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! shoplite-cli admin create -e admin@example.com -u admin -p <password>
//! ```

use thiserror::Error;

use shoplite_api::db::RepositoryError;
use shoplite_api::db::users::UserRepository;
use shoplite_api::services::{AuthError, AuthService, NewUser};
use shoplite_core::UserRole;

use super::CommandError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Registration-level failure (bad email, weak password, duplicate).
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin user.
///
/// Registers the account through the normal path, then promotes it.
///
/// # Errors
///
/// Returns `AdminError` if validation, the insert, or the promotion fails.
pub async fn create_user(email: &str, username: &str, password: &str) -> Result<(), AdminError> {
    let pool = super::connect().await?;

    tracing::info!("Creating admin user: {} ({})", username, email);

    let auth = AuthService::new(&pool);
    let user = auth
        .register(&NewUser {
            username,
            email,
            password,
            first_name: "",
            last_name: "",
            phone: None,
        })
        .await?;

    UserRepository::new(&pool)
        .set_role(user.id, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(())
}
