//! Authentication route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use shoplite_core::{Email, UserId, UserRole};

use crate::error::ApiError;
use crate::middleware::{
    clear_session, current_user, establish_login, require_user,
};
use crate::models::User;
use crate::routes::{ok_message, parse_body, preflight};
use crate::services::{AuthService, NewUser};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Action query string.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub action: Option<String>,
}

// =============================================================================
// View Types
// =============================================================================

/// Profile fields exposed to the client.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch an auth action.
///
/// # Errors
///
/// Returns `ApiError` per the envelope convention.
#[instrument(skip_all, fields(action = query.action.as_deref()))]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    Query(query): Query<AuthQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method == Method::OPTIONS {
        return Ok(preflight());
    }

    let action = query.action.as_deref().unwrap_or_default();

    match (method, action) {
        (Method::POST, "register") => register(&state, &body).await,
        (Method::POST, "login") => login(&state, &session, &body).await,
        (Method::POST, "logout") => logout(&session).await,
        (Method::GET, "profile") => get_profile(&state, &session).await,
        (Method::PUT, "profile") => update_profile(&state, &session, &body).await,
        (Method::POST, "change-password") => change_password(&state, &session, &body).await,
        (Method::GET, "check-auth") => check_auth(&session).await,
        _ => Err(ApiError::invalid_action()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn register(state: &AppState, body: &Bytes) -> Result<Response, ApiError> {
    let req: RegisterRequest = parse_body(body)?;

    let (Some(username), Some(email), Some(password)) = (
        req.username.as_deref().filter(|u| !u.trim().is_empty()),
        req.email.as_deref(),
        req.password.as_deref(),
    ) else {
        return Err(ApiError::Validation(
            "Username, email and password are required".to_owned(),
        ));
    };

    let auth = AuthService::new(state.pool());
    auth.register(&NewUser {
        username,
        email,
        password,
        first_name: &req.first_name,
        last_name: &req.last_name,
        phone: req.phone.as_deref(),
    })
    .await?;

    Ok(ok_message("Registration successful"))
}

async fn login(state: &AppState, session: &Session, body: &Bytes) -> Result<Response, ApiError> {
    let req: LoginRequest = parse_body(body)?;

    let (Some(email), Some(password)) = (req.email.as_deref(), req.password.as_deref()) else {
        return Err(ApiError::Validation(
            "Email and password are required".to_owned(),
        ));
    };

    let auth = AuthService::new(state.pool());
    let user = auth.login(email, password).await?;

    establish_login(session, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.display_name(),
            "role": user.role,
        },
    }))
    .into_response())
}

async fn logout(session: &Session) -> Result<Response, ApiError> {
    clear_session(session).await?;
    Ok(ok_message("Logged out successfully"))
}

async fn get_profile(state: &AppState, session: &Session) -> Result<Response, ApiError> {
    let current = require_user(session).await?;

    let auth = AuthService::new(state.pool());
    let user = auth.get_profile(current.id).await?;

    Ok(Json(json!({
        "success": true,
        "profile": ProfileView::from(&user),
    }))
    .into_response())
}

async fn update_profile(
    state: &AppState,
    session: &Session,
    body: &Bytes,
) -> Result<Response, ApiError> {
    let current = require_user(session).await?;
    let req: UpdateProfileRequest = parse_body(body)?;

    let auth = AuthService::new(state.pool());
    auth.update_profile(
        current.id,
        &req.first_name,
        &req.last_name,
        req.phone.as_deref(),
    )
    .await?;

    Ok(ok_message("Profile updated successfully"))
}

async fn change_password(
    state: &AppState,
    session: &Session,
    body: &Bytes,
) -> Result<Response, ApiError> {
    let current = require_user(session).await?;
    let req: ChangePasswordRequest = parse_body(body)?;

    let (Some(current_password), Some(new_password)) = (
        req.current_password.as_deref(),
        req.new_password.as_deref(),
    ) else {
        return Err(ApiError::Validation(
            "Current and new password are required".to_owned(),
        ));
    };

    let auth = AuthService::new(state.pool());
    auth.change_password(current.id, current_password, new_password)
        .await?;

    Ok(ok_message("Password changed successfully"))
}

async fn check_auth(session: &Session) -> Result<Response, ApiError> {
    let body = match current_user(session).await? {
        Some(user) => json!({
            "success": true,
            "logged_in": true,
            "user": {
                "id": user.id,
                "email": user.email,
                "name": user.name,
                "role": user.role,
            },
        }),
        None => json!({
            "success": true,
            "logged_in": false,
        }),
    };

    Ok(Json(body).into_response())
}
