//! Product route handlers.
//!
//! Read actions are public; `create`, `update`, and `delete` require the
//! admin role (anonymous callers get 401, non-admins 403).

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use shoplite_core::{CategoryId, ProductId, ProductStatus};

use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::models::{CatalogProduct, ProductInput};
use crate::routes::{ok_message, parse_body, preflight};
use crate::services::CatalogService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Action query string.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub action: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub category_id: Option<i64>,
    /// Used by `detail`, `update`, and `delete`.
    pub id: Option<i64>,
    /// Used by `search`.
    pub q: Option<String>,
}

// =============================================================================
// View Types
// =============================================================================

/// One product as exposed to the client, category fields flattened in.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
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

impl From<&CatalogProduct> for ProductView {
    fn from(catalog: &CatalogProduct) -> Self {
        let p = &catalog.product;
        Self {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            sku: p.sku.clone(),
            description: p.description.clone(),
            short_description: p.short_description.clone(),
            price: p.price,
            sale_price: p.sale_price,
            category_id: p.category_id,
            category_name: catalog.category_name.clone(),
            category_slug: catalog.category_slug.clone(),
            image_url: p.image_url.clone(),
            gallery_images: p.gallery_images.clone(),
            file_url: p.file_url.clone(),
            file_type: p.file_type.clone(),
            file_size: p.file_size,
            download_limit: p.download_limit,
            stock_quantity: p.stock_quantity,
            is_digital: p.is_digital,
            is_featured: p.is_featured,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch a products action.
///
/// # Errors
///
/// Returns `ApiError` per the envelope convention.
#[instrument(skip_all, fields(action = query.action.as_deref()))]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    Query(query): Query<ProductsQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method == Method::OPTIONS {
        return Ok(preflight());
    }

    let action = query.action.as_deref().unwrap_or_default();

    match (method, action) {
        (Method::GET, "list") => list(&state, &query).await,
        (Method::GET, "featured") => featured(&state, query.limit).await,
        (Method::GET, "detail") => detail(&state, query.id).await,
        (Method::GET, "search") => search(&state, &query).await,
        (Method::POST, "create") => create(&state, &session, &body).await,
        (Method::PUT, "update") => update(&state, &session, query.id, &body).await,
        (Method::DELETE, "delete") => delete(&state, &session, query.id).await,
        _ => Err(ApiError::invalid_action()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn required_id(id: Option<i64>) -> Result<ProductId, ApiError> {
    id.map(ProductId::new)
        .ok_or_else(|| ApiError::Validation("Product ID required".to_owned()))
}

async fn list(state: &AppState, query: &ProductsQuery) -> Result<Response, ApiError> {
    let catalog = CatalogService::new(state.pool());
    let page = catalog
        .list(
            query.limit,
            query.offset,
            query.category_id.map(CategoryId::new),
        )
        .await?;

    let products: Vec<ProductView> = page.items.iter().map(ProductView::from).collect();

    Ok(Json(json!({
        "success": true,
        "products": products,
        "total": page.total,
        "limit": page.limit,
        "offset": page.offset,
    }))
    .into_response())
}

async fn featured(state: &AppState, limit: Option<i64>) -> Result<Response, ApiError> {
    let catalog = CatalogService::new(state.pool());
    let items = catalog.featured(limit).await?;

    let products: Vec<ProductView> = items.iter().map(ProductView::from).collect();

    Ok(Json(json!({ "success": true, "products": products })).into_response())
}

async fn detail(state: &AppState, id: Option<i64>) -> Result<Response, ApiError> {
    let id = required_id(id)?;

    let catalog = CatalogService::new(state.pool());
    let product = catalog
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

    Ok(Json(json!({
        "success": true,
        "product": ProductView::from(&product),
    }))
    .into_response())
}

async fn search(state: &AppState, query: &ProductsQuery) -> Result<Response, ApiError> {
    let q = query.q.as_deref().unwrap_or_default();

    let catalog = CatalogService::new(state.pool());
    let items = catalog.search(q, query.limit, query.offset).await?;

    let products: Vec<ProductView> = items.iter().map(ProductView::from).collect();

    Ok(Json(json!({
        "success": true,
        "products": products,
        "query": q.trim(),
    }))
    .into_response())
}

async fn create(state: &AppState, session: &Session, body: &Bytes) -> Result<Response, ApiError> {
    require_admin(session).await?;

    let input: ProductInput = parse_body(body)?;

    let catalog = CatalogService::new(state.pool());
    let product = catalog.create(&input).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Product created successfully",
        "id": product.id,
    }))
    .into_response())
}

async fn update(
    state: &AppState,
    session: &Session,
    id: Option<i64>,
    body: &Bytes,
) -> Result<Response, ApiError> {
    require_admin(session).await?;

    let id = required_id(id)?;
    let input: ProductInput = parse_body(body)?;

    let catalog = CatalogService::new(state.pool());
    catalog.update(id, &input).await?;

    Ok(ok_message("Product updated successfully"))
}

async fn delete(
    state: &AppState,
    session: &Session,
    id: Option<i64>,
) -> Result<Response, ApiError> {
    require_admin(session).await?;

    let id = required_id(id)?;

    let catalog = CatalogService::new(state.pool());
    catalog.delete(id).await?;

    Ok(ok_message("Product deleted successfully"))
}
