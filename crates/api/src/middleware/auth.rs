//! Session identity helpers.
//!
//! The action-dispatch handlers resolve the caller's identity once per
//! request through these helpers and pass it down; services never read
//! session state themselves.

use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CartOwner, CurrentUser, User, session_keys};

/// The logged-in user, if any.
///
/// # Errors
///
/// Returns `ApiError::Session` if the session store fails.
pub async fn current_user(session: &Session) -> Result<Option<CurrentUser>, ApiError> {
    Ok(session.get(session_keys::CURRENT_USER).await?)
}

/// The logged-in user, or a 401 rejection.
///
/// # Errors
///
/// Returns `ApiError::Auth` if nobody is logged in.
pub async fn require_user(session: &Session) -> Result<CurrentUser, ApiError> {
    current_user(session)
        .await?
        .ok_or_else(ApiError::login_required)
}

/// The logged-in admin, or a 401/403 rejection.
///
/// Anonymous callers get 401; authenticated non-admins get 403.
///
/// # Errors
///
/// Returns `ApiError::Auth` or `ApiError::Forbidden` accordingly.
pub async fn require_admin(session: &Session) -> Result<CurrentUser, ApiError> {
    let user = require_user(session).await?;

    if !user.role.is_admin() {
        return Err(ApiError::Forbidden("Admin access required".to_owned()));
    }

    Ok(user)
}

/// Resolve the cart owner for this request.
///
/// A logged-in caller owns their cart by user id. An anonymous caller is
/// assigned a random guest id, persisted in the session so repeat requests
/// see the same cart.
///
/// # Errors
///
/// Returns `ApiError::Session` if the session store fails.
pub async fn resolve_cart_owner(session: &Session) -> Result<CartOwner, ApiError> {
    if let Some(user) = current_user(session).await? {
        return Ok(CartOwner::User(user.id));
    }

    if let Some(guest_id) = session
        .get::<String>(session_keys::GUEST_CART_ID)
        .await?
    {
        return Ok(CartOwner::Guest(guest_id));
    }

    let guest_id = Uuid::new_v4().to_string();
    session
        .insert(session_keys::GUEST_CART_ID, &guest_id)
        .await?;

    Ok(CartOwner::Guest(guest_id))
}

/// Store the logged-in identity in the session.
///
/// # Errors
///
/// Returns `ApiError::Session` if the session store fails.
pub async fn establish_login(session: &Session, user: &User) -> Result<(), ApiError> {
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(user))
        .await?;
    Ok(())
}

/// Drop all session state, logging the caller out.
///
/// # Errors
///
/// Returns `ApiError::Session` if the session store fails.
pub async fn clear_session(session: &Session) -> Result<(), ApiError> {
    session.flush().await?;
    Ok(())
}
