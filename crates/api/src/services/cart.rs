//! Cart service.
//!
//! Quantity-increasing mutations re-read current stock and reject, never
//! clamp, when the resulting quantity would exceed it. Stock is
//! informational only: nothing here decrements it. The stock check and the
//! quantity write are separate statements, so concurrent mutations against
//! the same line can oversell slightly; checkout, which would make that
//! matter, lives outside this system.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;

use shoplite_core::ProductId;

use crate::db::RepositoryError;
use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::models::{AddToCartOutcome, CartLine, CartOwner};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No active product with the given ID.
    #[error("product not found")]
    ProductNotFound,

    /// Requested quantity exceeds current stock.
    #[error("insufficient stock")]
    InsufficientStock,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Add a quantity of a product to the owner's cart.
    ///
    /// Inserts a new line or accumulates onto the existing one, reporting
    /// which. The whole resulting quantity is checked against stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if no active product matches.
    /// Returns `CartError::InsufficientStock` if the resulting quantity
    /// exceeds stock; storage is left unchanged.
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<AddToCartOutcome, CartError> {
        let product = self
            .products
            .get_active(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let existing = self.carts.find_line(owner, product_id).await?;
        // An accumulated quantity that overflows cannot fit any stock level.
        let resulting = match existing {
            Some((_, current)) => current
                .checked_add(quantity)
                .ok_or(CartError::InsufficientStock)?,
            None => quantity,
        };

        if resulting > product.product.stock_quantity {
            return Err(CartError::InsufficientStock);
        }

        if existing.is_some() {
            self.carts
                .set_quantity(owner, product_id, resulting)
                .await?;
            Ok(AddToCartOutcome::Updated)
        } else {
            self.carts.insert_line(owner, product_id, quantity).await?;
            Ok(AddToCartOutcome::Added)
        }
    }

    /// Overwrite the stored quantity of the owner's line for a product.
    ///
    /// Looks stock up without a status filter so a line on a since
    /// deactivated product can still be adjusted. Succeeds as a no-op when
    /// the owner has no line for the product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product row is gone.
    /// Returns `CartError::InsufficientStock` if the quantity exceeds
    /// stock; the stored quantity is left unchanged.
    pub async fn update_quantity(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), CartError> {
        let stock = self
            .products
            .stock_quantity(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        if quantity > stock {
            return Err(CartError::InsufficientStock);
        }

        self.carts.set_quantity(owner, product_id, quantity).await?;

        Ok(())
    }

    /// The owner's cart lines with joined product fields.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn get_cart(&self, owner: &CartOwner) -> Result<Vec<CartLine>, CartError> {
        Ok(self.carts.list(owner).await?)
    }

    /// Remove the owner's line for a product.
    ///
    /// Succeeds as a no-op when no line exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
    ) -> Result<(), CartError> {
        self.carts.remove(owner, product_id).await?;
        Ok(())
    }

    /// Remove all of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn clear(&self, owner: &CartOwner) -> Result<(), CartError> {
        self.carts.clear(owner).await?;
        Ok(())
    }

    /// Sum of `quantity * current price` over the owner's lines.
    ///
    /// Price changes between add and read change the reported total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn cart_total(&self, owner: &CartOwner) -> Result<Decimal, CartError> {
        let lines = self.carts.list(owner).await?;
        Ok(lines.iter().map(CartLine::line_total).sum())
    }

    /// Total units across the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn item_count(&self, owner: &CartOwner) -> Result<i64, CartError> {
        Ok(self.carts.count_units(owner).await?)
    }
}
