//! User domain types.

use chrono::{DateTime, Utc};

use shoplite_core::{Email, UserId, UserRole};

/// A registered storefront user.
///
/// The password hash never leaves the repository layer; this type carries
/// only what read operations are allowed to expose.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// User's email address.
    pub email: Email,
    /// First name (may be empty).
    pub first_name: String,
    /// Last name (may be empty).
    pub last_name: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Permission role.
    pub role: UserRole,
    /// Inactive users cannot log in.
    pub is_active: bool,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name: "First Last", trimmed when either part is empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}
