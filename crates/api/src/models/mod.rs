//! Domain model types.
//!
//! These types represent validated domain objects separate from database
//! row shapes and from the JSON views the routes serialize.

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{AddToCartOutcome, CartLine, CartOwner};
pub use product::{CatalogProduct, Category, Product, ProductInput};
pub use session::{CurrentUser, session_keys};
pub use user::User;
