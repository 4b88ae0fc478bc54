//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Wildcard CORS response headers (set-header; OPTIONS still reaches
//!    the action dispatchers)
//! 3. Session layer (tower-sessions with `SQLite` store)

pub mod auth;
pub mod session;

pub use auth::{
    clear_session, current_user, establish_login, require_admin, require_user, resolve_cart_owner,
};
pub use session::create_session_layer;
