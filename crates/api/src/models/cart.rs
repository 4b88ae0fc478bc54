//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shoplite_core::{CartItemId, ProductId, UserId};

/// The identity a cart's lines are keyed by.
///
/// A line belongs to exactly one of an authenticated user or an anonymous
/// guest session, never both. The gateway resolves this once per request;
/// the cart engine never infers identity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    /// Authenticated user.
    User(UserId),
    /// Guest, identified by a session-scoped id.
    Guest(String),
}

/// A cart line joined with the display fields of its product.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Product name at read time.
    pub name: String,
    /// Current product price; totals always reflect the price at read time.
    pub price: Decimal,
    pub image_url: Option<String>,
    pub short_description: String,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Line subtotal at the current price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// What an add-to-cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddToCartOutcome {
    /// A new line was inserted.
    Added,
    /// An existing line's quantity was increased.
    Updated,
}
