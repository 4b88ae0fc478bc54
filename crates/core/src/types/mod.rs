//! Shared type definitions.

mod email;
mod id;
mod status;

pub use email::{Email, EmailError};
pub use id::{CartItemId, CategoryId, ProductId, UserId};
pub use status::{ProductStatus, UserRole};
