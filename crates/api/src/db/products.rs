//! Product and category repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use shoplite_core::{CategoryId, ProductId, ProductStatus};

use super::RepositoryError;
use crate::models::{CatalogProduct, Category, Product, ProductInput};

/// Default per-product download allowance.
const DEFAULT_DOWNLOAD_LIMIT: i64 = 5;

/// Product columns joined with the (possibly missing) category.
const CATALOG_SELECT: &str = "SELECT p.*, c.name AS category_name, c.slug AS category_slug \
                              FROM products p \
                              LEFT JOIN categories c ON c.id = p.category_id";

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List active products, newest first, with the matching total count.
    ///
    /// The count ignores pagination so callers can page through results.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<CategoryId>,
    ) -> Result<(Vec<CatalogProduct>, i64), RepositoryError> {
        let sql = format!(
            "{CATALOG_SELECT} \
             WHERE p.status = 'active' \
               AND (?1 IS NULL OR p.category_id = ?1) \
             ORDER BY p.created_at DESC LIMIT ?2 OFFSET ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM products \
             WHERE status = 'active' AND (?1 IS NULL OR category_id = ?1)",
        )
        .bind(category_id)
        .fetch_one(self.pool)
        .await?
        .try_get("total")?;

        let items = rows
            .iter()
            .map(catalog_product_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    /// List featured active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn featured(&self, limit: i64) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let sql = format!(
            "{CATALOG_SELECT} \
             WHERE p.status = 'active' AND p.is_featured = 1 \
             ORDER BY p.created_at DESC LIMIT ?1"
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(self.pool).await?;

        rows.iter().map(catalog_product_from_row).collect()
    }

    /// Case-insensitive substring search over name and both descriptions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let pattern = format!("%{query}%");
        let sql = format!(
            "{CATALOG_SELECT} \
             WHERE p.status = 'active' \
               AND (p.name LIKE ?1 OR p.description LIKE ?1 OR p.short_description LIKE ?1) \
             ORDER BY p.created_at DESC LIMIT ?2 OFFSET ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        rows.iter().map(catalog_product_from_row).collect()
    }

    /// Get an active product by ID, with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_active(
        &self,
        id: ProductId,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let sql = format!("{CATALOG_SELECT} WHERE p.id = ?1 AND p.status = 'active'");
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool).await?;

        row.as_ref().map(catalog_product_from_row).transpose()
    }

    /// Get an active product by slug, with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CatalogProduct>, RepositoryError> {
        let sql = format!("{CATALOG_SELECT} WHERE p.slug = ?1 AND p.status = 'active'");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.as_ref().map(catalog_product_from_row).transpose()
    }

    /// Current stock for a product, regardless of its status.
    ///
    /// Cart quantity updates look stock up here so a line on a since
    /// deactivated product can still be adjusted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_quantity(
        &self,
        id: ProductId,
    ) -> Result<Option<i64>, RepositoryError> {
        let row = sqlx::query("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| r.try_get("stock_quantity"))
            .transpose()
            .map_err(RepositoryError::Database)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, or
    /// `RepositoryError::DataCorruption` if the gallery cannot be encoded.
    pub async fn create(
        &self,
        slug: &str,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let created_at = Utc::now();
        let gallery = input.gallery_images.clone().unwrap_or_default();
        let status = input.status.unwrap_or_default();

        let result = sqlx::query(
            "INSERT INTO products \
             (name, slug, sku, description, short_description, price, sale_price, \
              category_id, image_url, gallery_images, file_url, file_type, file_size, \
              download_limit, stock_quantity, is_digital, is_featured, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )
        .bind(&input.name)
        .bind(slug)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(&input.short_description)
        .bind(input.price.to_string())
        .bind(input.sale_price.map(|p| p.to_string()))
        .bind(input.category_id)
        .bind(&input.image_url)
        .bind(encode_gallery(&gallery)?)
        .bind(&input.file_url)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(input.download_limit.unwrap_or(DEFAULT_DOWNLOAD_LIMIT))
        .bind(input.stock_quantity.unwrap_or(0))
        .bind(input.is_digital.unwrap_or(true))
        .bind(input.is_featured.unwrap_or(false))
        .bind(status.as_str())
        .bind(created_at)
        .execute(self.pool)
        .await?;

        Ok(Product {
            id: ProductId::new(result.last_insert_rowid()),
            name: input.name.clone(),
            slug: slug.to_owned(),
            sku: input.sku.clone(),
            description: input.description.clone(),
            short_description: input.short_description.clone(),
            price: input.price,
            sale_price: input.sale_price,
            category_id: input.category_id,
            image_url: input.image_url.clone(),
            gallery_images: gallery,
            file_url: input.file_url.clone(),
            file_type: input.file_type.clone(),
            file_size: input.file_size,
            download_limit: input.download_limit.unwrap_or(DEFAULT_DOWNLOAD_LIMIT),
            stock_quantity: input.stock_quantity.unwrap_or(0),
            is_digital: input.is_digital.unwrap_or(true),
            is_featured: input.is_featured.unwrap_or(false),
            status,
            created_at,
        })
    }

    /// Replace a product's fields.
    ///
    /// Succeeds as a no-op when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails, or
    /// `RepositoryError::DataCorruption` if the gallery cannot be encoded.
    pub async fn update(
        &self,
        id: ProductId,
        slug: &str,
        input: &ProductInput,
    ) -> Result<(), RepositoryError> {
        let gallery = input.gallery_images.clone().unwrap_or_default();

        sqlx::query(
            "UPDATE products SET \
             name = ?1, slug = ?2, sku = ?3, description = ?4, short_description = ?5, \
             price = ?6, sale_price = ?7, category_id = ?8, image_url = ?9, \
             gallery_images = ?10, file_url = ?11, file_type = ?12, file_size = ?13, \
             download_limit = ?14, stock_quantity = ?15, is_digital = ?16, \
             is_featured = ?17, status = ?18 \
             WHERE id = ?19",
        )
        .bind(&input.name)
        .bind(slug)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(&input.short_description)
        .bind(input.price.to_string())
        .bind(input.sale_price.map(|p| p.to_string()))
        .bind(input.category_id)
        .bind(&input.image_url)
        .bind(encode_gallery(&gallery)?)
        .bind(&input.file_url)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(input.download_limit.unwrap_or(DEFAULT_DOWNLOAD_LIMIT))
        .bind(input.stock_quantity.unwrap_or(0))
        .bind(input.is_digital.unwrap_or(true))
        .bind(input.is_featured.unwrap_or(false))
        .bind(input.status.unwrap_or_default().as_str())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a product and, via cascade, any cart lines referencing it.
    ///
    /// Succeeds as a no-op when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// List all categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    slug: row.try_get("slug")?,
                })
            })
            .collect()
    }

    /// Insert a category. Used by seed tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists,
    /// `RepositoryError::Database` for other database errors.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<CategoryId, RepositoryError> {
        let result = sqlx::query("INSERT INTO categories (name, slug) VALUES (?1, ?2)")
            .bind(name)
            .bind(slug)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!("category slug {slug:?} exists"));
                }
                RepositoryError::Database(e)
            })?;

        Ok(CategoryId::new(result.last_insert_rowid()))
    }
}

fn encode_gallery(gallery: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(gallery)
        .map_err(|e| RepositoryError::DataCorruption(format!("gallery encoding failed: {e}")))
}

fn decode_gallery(raw: Option<String>) -> Result<Vec<String>, RepositoryError> {
    raw.map_or_else(
        || Ok(Vec::new()),
        |raw| {
            serde_json::from_str(&raw).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid gallery in database: {e}"))
            })
        },
    )
}

fn parse_price(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid price in database: {e}")))
}

/// Map a product row joined with its category columns.
fn catalog_product_from_row(row: &SqliteRow) -> Result<CatalogProduct, RepositoryError> {
    let price: String = row.try_get("price")?;
    let sale_price: Option<String> = row.try_get("sale_price")?;

    let status: String = row.try_get("status")?;
    let status: ProductStatus = status.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
    })?;

    let product = Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        sku: row.try_get("sku")?,
        description: row.try_get("description")?,
        short_description: row.try_get("short_description")?,
        price: parse_price(&price)?,
        sale_price: sale_price.as_deref().map(parse_price).transpose()?,
        category_id: row
            .try_get::<Option<i64>, _>("category_id")?
            .map(CategoryId::new),
        image_url: row.try_get("image_url")?,
        gallery_images: decode_gallery(row.try_get("gallery_images")?)?,
        file_url: row.try_get("file_url")?,
        file_type: row.try_get("file_type")?,
        file_size: row.try_get("file_size")?,
        download_limit: row.try_get("download_limit")?,
        stock_quantity: row.try_get("stock_quantity")?,
        is_digital: row.try_get("is_digital")?,
        is_featured: row.try_get("is_featured")?,
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    };

    Ok(CatalogProduct {
        product,
        category_name: row.try_get("category_name")?,
        category_slug: row.try_get("category_slug")?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn input(name: &str, sku: &str, price: &str) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            sku: sku.to_owned(),
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
            stock_quantity: Some(10),
            is_digital: None,
            is_featured: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let mut new = input("Synth Pack", "SP-001", "19.99");
        new.gallery_images = Some(vec!["a.png".to_owned(), "b.png".to_owned()]);
        let created = repo.create("synth-pack", &new).await.unwrap();

        let found = repo.get_active(created.id).await.unwrap().unwrap();
        assert_eq!(found.product.name, "Synth Pack");
        assert_eq!(found.product.price, "19.99".parse().unwrap());
        assert_eq!(found.product.gallery_images, vec!["a.png", "b.png"]);
        assert_eq!(found.product.download_limit, 5);
        assert!(found.category_name.is_none());

        let by_slug = repo.get_active_by_slug("synth-pack").await.unwrap();
        assert_eq!(by_slug.unwrap().product.id, created.id);
    }

    #[tokio::test]
    async fn get_active_hides_inactive_products() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let mut new = input("Hidden", "H-001", "5.00");
        new.status = Some(ProductStatus::Inactive);
        let created = repo.create("hidden", &new).await.unwrap();

        assert!(repo.get_active(created.id).await.unwrap().is_none());
        // Stock stays visible for cart adjustments.
        assert_eq!(repo.stock_quantity(created.id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn list_reports_total_beyond_the_page() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        for i in 0..3 {
            repo.create(
                &format!("pack-{i}"),
                &input(&format!("Pack {i}"), &format!("P-{i:03}"), "9.99"),
            )
            .await
            .unwrap();
        }

        let (items, total) = repo.list(2, 0, None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let beats = repo.create_category("Beats", "beats").await.unwrap();

        let mut a = input("Drum Loop", "D-001", "9.99");
        a.category_id = Some(beats);
        repo.create("drum-loop", &a).await.unwrap();
        repo.create("vocal-kit", &input("Vocal Kit", "V-001", "14.99"))
            .await
            .unwrap();

        let (items, total) = repo.list(10, 0, Some(beats)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].product.name, "Drum Loop");
        assert_eq!(items[0].category_name.as_deref(), Some("Beats"));
        assert_eq!(items[0].category_slug.as_deref(), Some("beats"));
    }

    #[tokio::test]
    async fn search_matches_name_and_descriptions() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let mut described = input("Plain", "P-001", "1.00");
        described.short_description = "lo-fi drum textures".to_owned();
        repo.create("plain", &described).await.unwrap();
        repo.create("other", &input("Other", "O-001", "1.00"))
            .await
            .unwrap();

        let found = repo.search("DRUM", 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product.name, "Plain");

        assert!(repo.search("nothing", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn featured_only() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let mut featured = input("Star", "S-001", "1.00");
        featured.is_featured = Some(true);
        repo.create("star", &featured).await.unwrap();
        repo.create("plain", &input("Plain", "P-001", "1.00"))
            .await
            .unwrap();

        let found = repo.featured(5).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product.name, "Star");
    }

    #[tokio::test]
    async fn update_and_delete_missing_product_are_no_ops() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let ghost = ProductId::new(999);
        repo.update(ghost, "ghost", &input("Ghost", "G-001", "1.00"))
            .await
            .unwrap();
        repo.delete(ghost).await.unwrap();
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let created = repo
            .create("old-name", &input("Old Name", "O-001", "3.00"))
            .await
            .unwrap();

        let mut changed = input("New Name", "O-001", "4.50");
        changed.stock_quantity = Some(7);
        repo.update(created.id, "new-name", &changed).await.unwrap();

        let found = repo.get_active(created.id).await.unwrap().unwrap();
        assert_eq!(found.product.name, "New Name");
        assert_eq!(found.product.slug, "new-name");
        assert_eq!(found.product.price, "4.50".parse().unwrap());
        assert_eq!(found.product.stock_quantity, 7);
    }
}
