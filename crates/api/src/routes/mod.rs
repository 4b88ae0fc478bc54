//! HTTP route handlers for the API.
//!
//! Every endpoint is action-dispatched: the handler matches on the HTTP
//! method and the `action` query parameter, and answers with the uniform
//! JSON envelope (`{"success": true, ...}` / `{"success": false, "message"}`).
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the database)
//!
//! # Auth (/api/auth?action=...)
//! POST register                - Create an account
//! POST login                   - Establish a session
//! POST logout                  - Clear the session
//! GET  profile                 - Current user's profile
//! PUT  profile                 - Update first/last name and phone
//! POST change-password         - Rotate the password
//! GET  check-auth              - Logged-in flag plus identity
//!
//! # Cart (/api/cart?action=...)
//! POST   add                   - Add a product (guests allowed)
//! GET    get                   - Lines, total, and unit count
//! PUT    update                - Overwrite a line quantity (login required)
//! DELETE remove                - Remove a line (login required)
//! DELETE clear                 - Empty the cart
//! GET    count                 - Unit count only
//!
//! # Products (/api/products?action=...)
//! GET    list                  - Page of active products
//! GET    featured              - Featured products
//! GET    detail                - Single product by id
//! GET    search                - Substring search
//! POST   create                - Create a product (admin)
//! PUT    update                - Replace a product (admin)
//! DELETE delete                - Delete a product (admin)
//! ```
//!
//! An OPTIONS request to any endpoint answers `{"success": true}` for
//! preflight; an unrecognized (method, action) pair is rejected with a
//! generic invalid-action error.

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Json, Router,
    body::Bytes,
    response::{IntoResponse, Response},
    routing::any,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// Envelope for success responses that carry only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// `{"success": true, "message": ...}` as a response.
pub(crate) fn ok_message(message: &'static str) -> Response {
    Json(MessageResponse::new(message)).into_response()
}

/// `{"success": true}` for preflight requests.
pub(crate) fn preflight() -> Response {
    Json(json!({ "success": true })).into_response()
}

/// Parse a typed request struct out of the JSON body.
///
/// An empty body parses as `{}` so that per-field validation, not a parse
/// failure, reports what is missing.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.is_empty() { b"{}" } else { body };

    serde_json::from_slice(raw)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))
}

/// Create all action-dispatched API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth", any(auth::dispatch))
        .route("/api/cart", any(cart::dispatch))
        .route("/api/products", any(products::dispatch))
}
