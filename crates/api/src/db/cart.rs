//! Cart line repository.
//!
//! Every query is scoped by the owning identity. `user_id IS ?1 AND
//! session_id IS ?2` matches the NULL side of whichever identity is absent,
//! so one statement serves both user and guest carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use shoplite_core::{CartItemId, ProductId};

use super::RepositoryError;
use crate::models::{CartLine, CartOwner};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

/// Split an owner into its `(user_id, session_id)` column pair.
fn owner_columns(owner: &CartOwner) -> (Option<i64>, Option<&str>) {
    match owner {
        CartOwner::User(id) => (Some(id.as_i64()), None),
        CartOwner::Guest(session_id) => (None, Some(session_id)),
    }
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the owner's line for a product, if any.
    ///
    /// At most one line exists per (owner, product).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
    ) -> Result<Option<(CartItemId, i64)>, RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        let row = sqlx::query(
            "SELECT id, quantity FROM cart_items \
             WHERE user_id IS ?1 AND session_id IS ?2 AND product_id = ?3",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            Ok((
                CartItemId::new(r.try_get("id")?),
                r.try_get("quantity")?,
            ))
        })
        .transpose()
    }

    /// Insert a new line for the owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_line(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        sqlx::query(
            "INSERT INTO cart_items (user_id, session_id, product_id, quantity, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the quantity of the owner's line for a product.
    ///
    /// Returns the number of lines changed (zero when no line exists).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_quantity(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<u64, RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?1 \
             WHERE user_id IS ?2 AND session_id IS ?3 AND product_id = ?4",
        )
        .bind(quantity)
        .bind(user_id)
        .bind(session_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// List the owner's lines with product display fields, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn list(&self, owner: &CartOwner) -> Result<Vec<CartLine>, RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        let rows = sqlx::query(
            "SELECT ci.id, ci.product_id, ci.quantity, ci.created_at, \
                    p.name, p.price, p.image_url, p.short_description \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.user_id IS ?1 AND ci.session_id IS ?2 \
             ORDER BY ci.created_at DESC, ci.id DESC",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(cart_line_from_row).collect()
    }

    /// Remove the owner's line for a product.
    ///
    /// Returns the number of lines removed (zero when no line exists).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        let result = sqlx::query(
            "DELETE FROM cart_items \
             WHERE user_id IS ?1 AND session_id IS ?2 AND product_id = ?3",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Remove all of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, owner: &CartOwner) -> Result<(), RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        sqlx::query("DELETE FROM cart_items WHERE user_id IS ?1 AND session_id IS ?2")
            .bind(user_id)
            .bind(session_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Total units across the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_units(&self, owner: &CartOwner) -> Result<i64, RepositoryError> {
        let (user_id, session_id) = owner_columns(owner);

        let row = sqlx::query(
            "SELECT COALESCE(SUM(quantity), 0) AS units FROM cart_items \
             WHERE user_id IS ?1 AND session_id IS ?2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_one(self.pool)
        .await?;

        row.try_get("units").map_err(RepositoryError::Database)
    }
}

fn cart_line_from_row(row: &SqliteRow) -> Result<CartLine, RepositoryError> {
    let price: String = row.try_get("price")?;
    let price: Decimal = price.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
    })?;

    Ok(CartLine {
        id: CartItemId::new(row.try_get("id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        name: row.try_get("name")?,
        price,
        image_url: row.try_get("image_url")?,
        short_description: row.try_get("short_description")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::products::ProductRepository;
    use crate::db::test_pool;
    use crate::models::ProductInput;
    use shoplite_core::UserId;

    async fn seed_product(pool: &SqlitePool, name: &str, price: &str) -> ProductId {
        let input = ProductInput {
            name: name.to_owned(),
            sku: format!("{name}-sku"),
            price: price.parse().unwrap(),
            description: String::new(),
            short_description: String::new(),
            sale_price: None,
            category_id: None,
            image_url: None,
            gallery_images: None,
            file_url: None,
            file_type: None,
            file_size: None,
            download_limit: None,
            stock_quantity: Some(100),
            is_digital: None,
            is_featured: None,
            status: None,
        };
        ProductRepository::new(pool)
            .create(name, &input)
            .await
            .unwrap()
            .id
    }

    async fn seed_user(pool: &SqlitePool) -> UserId {
        use crate::db::users::{NewUserRow, UserRepository};
        use shoplite_core::{Email, UserRole};

        let email = Email::parse("cart@example.com").unwrap();
        UserRepository::new(pool)
            .create(&NewUserRow {
                username: "cartuser",
                email: &email,
                password_hash: "hash",
                first_name: "",
                last_name: "",
                phone: None,
                role: UserRole::Customer,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn guest_and_user_carts_are_separate() {
        let pool = test_pool().await;
        let repo = CartRepository::new(&pool);
        let product = seed_product(&pool, "loop", "9.99").await;
        let user = CartOwner::User(seed_user(&pool).await);
        let guest = CartOwner::Guest("guest-abc".to_owned());

        repo.insert_line(&user, product, 2).await.unwrap();
        repo.insert_line(&guest, product, 5).await.unwrap();

        assert_eq!(repo.count_units(&user).await.unwrap(), 2);
        assert_eq!(repo.count_units(&guest).await.unwrap(), 5);

        let (_, qty) = repo.find_line(&guest, product).await.unwrap().unwrap();
        assert_eq!(qty, 5);
    }

    #[tokio::test]
    async fn list_joins_product_fields() {
        let pool = test_pool().await;
        let repo = CartRepository::new(&pool);
        let product = seed_product(&pool, "kit", "24.50").await;
        let guest = CartOwner::Guest("guest-list".to_owned());

        repo.insert_line(&guest, product, 3).await.unwrap();

        let lines = repo.list(&guest).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "kit");
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].price, "24.50".parse().unwrap());
        assert_eq!(lines[0].line_total(), "73.50".parse().unwrap());
    }

    #[tokio::test]
    async fn set_quantity_reports_missing_line() {
        let pool = test_pool().await;
        let repo = CartRepository::new(&pool);
        let product = seed_product(&pool, "pads", "4.00").await;
        let guest = CartOwner::Guest("guest-upd".to_owned());

        assert_eq!(repo.set_quantity(&guest, product, 4).await.unwrap(), 0);

        repo.insert_line(&guest, product, 1).await.unwrap();
        assert_eq!(repo.set_quantity(&guest, product, 4).await.unwrap(), 1);

        let (_, qty) = repo.find_line(&guest, product).await.unwrap().unwrap();
        assert_eq!(qty, 4);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let pool = test_pool().await;
        let repo = CartRepository::new(&pool);
        let a = seed_product(&pool, "a", "1.00").await;
        let b = seed_product(&pool, "b", "2.00").await;
        let guest = CartOwner::Guest("guest-rm".to_owned());

        repo.insert_line(&guest, a, 1).await.unwrap();
        repo.insert_line(&guest, b, 1).await.unwrap();

        assert_eq!(repo.remove(&guest, a).await.unwrap(), 1);
        assert_eq!(repo.remove(&guest, a).await.unwrap(), 0);

        repo.clear(&guest).await.unwrap();
        assert_eq!(repo.count_units(&guest).await.unwrap(), 0);
    }
}
