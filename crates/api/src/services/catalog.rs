//! Catalog service.
//!
//! Read paths only ever expose active products; write paths are
//! unrestricted here, with admin authorization enforced at the routes.

use sqlx::SqlitePool;
use thiserror::Error;

use shoplite_core::{CategoryId, ProductId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::{CatalogProduct, Product, ProductInput};

/// Default page size for product listings.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Default number of featured products returned.
pub const DEFAULT_FEATURED_LIMIT: i64 = 5;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Search query is empty after trimming.
    #[error("search query is required")]
    EmptyQuery,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One page of a product listing.
#[derive(Debug)]
pub struct ProductPage {
    pub items: Vec<CatalogProduct>,
    /// Total matching rows, including this page.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// List active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        category_id: Option<CategoryId>,
    ) -> Result<ProductPage, CatalogError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0);
        let offset = offset.unwrap_or(0).max(0);

        let (items, total) = self.products.list(limit, offset, category_id).await?;

        Ok(ProductPage {
            items,
            total,
            limit,
            offset,
        })
    }

    /// List featured active products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<CatalogProduct>, CatalogError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).max(0);
        Ok(self.products.featured(limit).await?)
    }

    /// Get an active product by ID.
    ///
    /// Absent or inactive products are `None`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.get_active(id).await?)
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.get_active_by_slug(slug).await?)
    }

    /// Search active products by substring.
    ///
    /// Matching zero products is a success with an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyQuery` if the query is blank.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }

        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0);
        let offset = offset.unwrap_or(0).max(0);

        Ok(self.products.search(query, limit, offset).await?)
    }

    /// Create a product, deriving its slug from the name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, CatalogError> {
        let slug = slugify(&input.name);
        Ok(self.products.create(&slug, input).await?)
    }

    /// Replace a product's fields, re-deriving its slug from the name.
    ///
    /// Succeeds as a no-op when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<(), CatalogError> {
        let slug = slugify(&input.name);
        Ok(self.products.update(id, &slug, input).await?)
    }

    /// Delete a product.
    ///
    /// Succeeds as a no-op when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        Ok(self.products.delete(id).await?)
    }
}

/// Derive a URL-safe slug from a product name.
///
/// Lowercases, maps runs of non-alphanumerics to single hyphens, and trims
/// leading/trailing hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn input(name: &str, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            sku: format!("{name}-sku"),
            price: "9.99".parse().unwrap(),
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
            stock_quantity: Some(stock),
            is_digital: None,
            is_featured: None,
            status: None,
        }
    }

    #[test]
    fn slugify_flattens_punctuation() {
        assert_eq!(slugify("Drum & Bass Pack!"), "drum-bass-pack");
        assert_eq!(slugify("  Lo-Fi   Tapes  "), "lo-fi-tapes");
        assert_eq!(slugify("808"), "808");
        assert_eq!(slugify("***"), "");
    }

    #[tokio::test]
    async fn search_rejects_blank_queries() {
        let pool = test_pool().await;
        let catalog = CatalogService::new(&pool);

        let err = catalog.search("   ", None, None).await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyQuery));
    }

    #[tokio::test]
    async fn search_with_no_matches_is_empty_not_an_error() {
        let pool = test_pool().await;
        let catalog = CatalogService::new(&pool);

        let found = catalog.search("nothing here", None, None).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn list_applies_defaults_and_echoes_pagination() {
        let pool = test_pool().await;
        let catalog = CatalogService::new(&pool);

        catalog.create(&input("Pack", 5)).await.unwrap();

        let page = catalog.list(None, None, None).await.unwrap();
        assert_eq!(page.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(page.offset, 0);
        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].product.slug, "pack");
    }

    #[tokio::test]
    async fn update_rewrites_the_slug() {
        let pool = test_pool().await;
        let catalog = CatalogService::new(&pool);

        let created = catalog.create(&input("First Name", 5)).await.unwrap();
        assert_eq!(created.slug, "first-name");

        catalog
            .update(created.id, &input("Second Name", 5))
            .await
            .unwrap();

        let found = catalog.get_by_slug("second-name").await.unwrap().unwrap();
        assert_eq!(found.product.id, created.id);
    }
}
