//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use shoplite_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

/// Column list shared by every user read.
const USER_COLUMNS: &str = "id, username, email, first_name, last_name, phone, \
                            role, is_active, created_at";

/// Fields for inserting a new user.
#[derive(Debug)]
pub struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: UserRole,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether the email or username is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_or_username_taken(
        &self,
        email: &Email,
        username: &str,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT id FROM users WHERE email = ?1 OR username = ?2")
            .bind(email)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username already
    /// exists, `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUserRow<'_>) -> Result<User, RepositoryError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO users \
             (username, email, password_hash, first_name, last_name, phone, role, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone)
        .bind(new.role.as_str())
        .bind(created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email or username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(User {
            id: UserId::new(result.last_insert_rowid()),
            username: new.username.to_owned(),
            email: new.email.clone(),
            first_name: new.first_name.to_owned(),
            last_name: new.last_name.to_owned(),
            phone: new.phone.map(ToOwned::to_owned),
            role: new.role,
            is_active: true,
            created_at,
        })
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool).await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get an active user and their password hash by email.
    ///
    /// Returns `None` when no active user matches; login treats that the
    /// same as a failed credential check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_active_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users \
             WHERE email = ?1 AND is_active = 1"
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = user_from_row(&row)?;
        let password_hash: String = row.try_get("password_hash")?;

        Ok(Some((user, password_hash)))
    }

    /// Get a user's password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| r.try_get("password_hash"))
            .transpose()
            .map_err(RepositoryError::Database)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist,
    /// `RepositoryError::Database` for other database errors.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update the mutable profile fields.
    ///
    /// Succeeds as a no-op when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET first_name = ?1, last_name = ?2, phone = ?3 WHERE id = ?4",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Change a user's role.
    ///
    /// Used by operational tooling to promote admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist,
    /// `RepositoryError::Database` for other database errors.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
            .bind(role.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Map a user row, validating stored email and role.
fn user_from_row(row: &SqliteRow) -> Result<User, RepositoryError> {
    let email: String = row.try_get("email")?;
    let email = Email::parse(&email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
    })?;

    let role: String = row.try_get("role")?;
    let role: UserRole = role
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid role in database: {e}")))?;

    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        email,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        role,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
