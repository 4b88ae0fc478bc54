//! Authentication service.
//!
//! Handles registration, password login, password changes, and profile
//! reads/updates. Session establishment is the routes' concern; this
//! service only validates and returns the user record.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use shoplite_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{NewUserRow, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// A registration request, before validation.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// Registration never establishes a session; the caller logs in
    /// separately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email or username is
    /// already registered.
    pub async fn register(&self, new: &NewUser<'_>) -> Result<User, AuthError> {
        let email = Email::parse(new.email)?;
        validate_password(new.password)?;

        if self
            .users
            .email_or_username_taken(&email, new.username)
            .await?
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(new.password)?;

        let user = self
            .users
            .create(&NewUserRow {
                username: new.username,
                email: &email,
                password_hash: &password_hash,
                first_name: new.first_name,
                last_name: new.last_name,
                phone: new.phone,
                role: UserRole::Customer,
            })
            .await
            .map_err(|e| match e {
                // Lost the pre-check race against a concurrent registration.
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Inactive users are treated the same as unknown emails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_active_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Replace a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong. Returns `AuthError::WeakPassword` if the new password is too
    /// short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let stored_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current_password, &stored_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &new_hash).await?;

        Ok(())
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_profile(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update a user's profile fields.
    ///
    /// Succeeds as a no-op when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<(), AuthError> {
        self.users
            .update_profile(user_id, first_name, last_name, phone)
            .await?;
        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn new_user<'a>(username: &'a str, email: &'a str, password: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            email,
            password,
            first_name: "Ada",
            last_name: "Lovelace",
            phone: None,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth
            .register(&new_user("ada", "ada@example.com", "hunter22"))
            .await
            .unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.display_name(), "Ada Lovelace");

        let logged_in = auth.login("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        auth.register(&new_user("ada", "ada@example.com", "hunter22"))
            .await
            .unwrap();

        // Same email, different username.
        let err = auth
            .register(&new_user("other", "ada@example.com", "hunter22"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));

        // Same username, different email.
        let err = auth
            .register(&new_user("ada", "other@example.com", "hunter22"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_bad_email() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        let err = auth
            .register(&new_user("ada", "ada@example.com", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        let err = auth
            .register(&new_user("ada", "not-an-email", "hunter22"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        auth.register(&new_user("ada", "ada@example.com", "hunter22"))
            .await
            .unwrap();

        let err = auth.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_rejects_inactive_user() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth
            .register(&new_user("ada", "ada@example.com", "hunter22"))
            .await
            .unwrap();

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = auth.login("ada@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth
            .register(&new_user("ada", "ada@example.com", "hunter22"))
            .await
            .unwrap();

        let err = auth
            .change_password(user.id, "wrong", "newpassword")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        auth.change_password(user.id, "hunter22", "newpassword")
            .await
            .unwrap();

        auth.login("ada@example.com", "newpassword").await.unwrap();
        let err = auth.login("ada@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn update_profile_is_a_no_op_for_missing_users() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        auth.update_profile(UserId::new(404), "No", "Body", None)
            .await
            .unwrap();

        let err = auth.get_profile(UserId::new(404)).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
