//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use shoplite_core::{CategoryId, ProductId, ProductStatus};

/// A catalog category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe identifier, unique.
    pub slug: String,
}

/// A catalog product.
///
/// The gallery is an ordered sequence of URLs; its flattening into a single
/// text column is a storage concern handled by the repository.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL-safe identifier derived from the name.
    pub slug: String,
    /// Business identifier; uniqueness is expected but not enforced here.
    pub sku: String,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    /// Weak reference: may point at a category that no longer exists.
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub gallery_images: Vec<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub download_limit: i64,
    pub stock_quantity: i64,
    pub is_digital: bool,
    pub is_featured: bool,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

/// A product joined with its (possibly missing) category.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub product: Product,
    /// Null when the category reference is absent or dangling.
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Admin-supplied fields for creating or replacing a product.
///
/// Optional fields fall back to the catalog defaults (status active,
/// digital, not featured, download limit 5, zero stock).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub sale_price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub download_limit: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub is_digital: Option<bool>,
    pub is_featured: Option<bool>,
    pub status: Option<ProductStatus>,
}
