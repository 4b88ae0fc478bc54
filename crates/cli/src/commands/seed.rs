//! Demo data seeding command.
//!
//! Populates an empty database with a small digital-goods catalog so the
//! API has something to serve out of the box. Refuses to run twice: a
//! non-empty category table means the database is already seeded.

use thiserror::Error;

use shoplite_api::db::RepositoryError;
use shoplite_api::db::products::ProductRepository;
use shoplite_api::models::ProductInput;
use shoplite_api::services::catalog::slugify;
use shoplite_core::CategoryId;

use super::CommandError;

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

struct SeedProduct {
    name: &'static str,
    sku: &'static str,
    price: &'static str,
    short_description: &'static str,
    category: usize,
    stock: i64,
    featured: bool,
}

const CATEGORIES: &[(&str, &str)] = &[
    ("E-Books", "e-books"),
    ("Software", "software"),
    ("Audio Packs", "audio-packs"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Rust Patterns Handbook",
        sku: "EB-001",
        price: "14.99",
        short_description: "Practical design patterns, with worked examples.",
        category: 0,
        stock: 100,
        featured: true,
    },
    SeedProduct {
        name: "Async Cookbook",
        sku: "EB-002",
        price: "9.99",
        short_description: "Recipes for concurrent services.",
        category: 0,
        stock: 100,
        featured: false,
    },
    SeedProduct {
        name: "Invoice Builder Pro",
        sku: "SW-001",
        price: "49.00",
        short_description: "Desktop invoicing for small shops.",
        category: 1,
        stock: 50,
        featured: true,
    },
    SeedProduct {
        name: "Backup Butler",
        sku: "SW-002",
        price: "19.00",
        short_description: "Scheduled folder backups with versioning.",
        category: 1,
        stock: 50,
        featured: false,
    },
    SeedProduct {
        name: "Lo-Fi Drum Textures",
        sku: "AU-001",
        price: "24.50",
        short_description: "120 one-shot drum samples, 24-bit WAV.",
        category: 2,
        stock: 200,
        featured: true,
    },
    SeedProduct {
        name: "Analog Synth Loops",
        sku: "AU-002",
        price: "29.50",
        short_description: "80 tempo-labelled synth loops.",
        category: 2,
        stock: 200,
        featured: false,
    },
];

/// Seed demo categories and products.
///
/// # Errors
///
/// Returns `SeedError` if the connection fails or an insert fails.
pub async fn run() -> Result<(), SeedError> {
    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    if !repo.list_categories().await?.is_empty() {
        tracing::info!("Database already seeded, nothing to do");
        return Ok(());
    }

    tracing::info!("Seeding {} categories...", CATEGORIES.len());
    let mut category_ids: Vec<CategoryId> = Vec::with_capacity(CATEGORIES.len());
    for (name, slug) in CATEGORIES {
        category_ids.push(repo.create_category(name, slug).await?);
    }

    tracing::info!("Seeding {} products...", PRODUCTS.len());
    for seed in PRODUCTS {
        let input = ProductInput {
            name: seed.name.to_owned(),
            sku: seed.sku.to_owned(),
            price: seed.price.parse().map_err(|_| {
                RepositoryError::DataCorruption(format!("bad seed price for {}", seed.sku))
            })?,
            description: seed.short_description.to_owned(),
            short_description: seed.short_description.to_owned(),
            sale_price: None,
            category_id: Some(category_ids[seed.category]),
            image_url: None,
            gallery_images: None,
            file_url: None,
            file_type: None,
            file_size: None,
            download_limit: None,
            stock_quantity: Some(seed.stock),
            is_digital: Some(true),
            is_featured: Some(seed.featured),
            status: None,
        };
        repo.create(&slugify(seed.name), &input).await?;
    }

    tracing::info!("Seeding complete");
    Ok(())
}
