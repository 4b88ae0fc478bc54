//! Business logic services.
//!
//! Services sit between the routes and the repositories: they own
//! validation and policy, and convert repository failures into their own
//! error types. None of them touch session state; the routes resolve the
//! caller's identity and pass it in.

pub mod auth;
pub mod cart;
pub mod catalog;

pub use auth::{AuthError, AuthService, NewUser};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, ProductPage};
