//! Cart route handlers.
//!
//! `add`, `get`, `clear`, and `count` work for guests; `update` and
//! `remove` are only exposed to logged-in callers, mirroring the
//! storefront's contract.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use shoplite_core::{CartItemId, ProductId};

use crate::error::ApiError;
use crate::middleware::{current_user, resolve_cart_owner};
use crate::models::{AddToCartOutcome, CartLine, CartOwner};
use crate::routes::{ok_message, parse_body, preflight};
use crate::services::CartService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

/// Action query string. `product_id` is used by `remove`.
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub action: Option<String>,
    pub product_id: Option<i64>,
}

// =============================================================================
// View Types
// =============================================================================

/// One cart line as exposed to the client.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub short_description: String,
    pub line_total: Decimal,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            name: line.name.clone(),
            price: line.price,
            image_url: line.image_url.clone(),
            short_description: line.short_description.clone(),
            line_total: line.line_total(),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch a cart action.
///
/// # Errors
///
/// Returns `ApiError` per the envelope convention.
#[instrument(skip_all, fields(action = query.action.as_deref()))]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    Query(query): Query<CartQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method == Method::OPTIONS {
        return Ok(preflight());
    }

    let action = query.action.as_deref().unwrap_or_default();

    match (method, action) {
        (Method::POST, "add") => add(&state, &session, &body).await,
        (Method::GET, "get") => get(&state, &session).await,
        (Method::PUT, "update") => update(&state, &session, &body).await,
        (Method::DELETE, "remove") => remove(&state, &session, query.product_id).await,
        (Method::DELETE, "clear") => clear(&state, &session).await,
        (Method::GET, "count") => count(&state, &session).await,
        _ => Err(ApiError::invalid_action()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn required_product_id(product_id: Option<i64>) -> Result<ProductId, ApiError> {
    product_id
        .map(ProductId::new)
        .ok_or_else(|| ApiError::Validation("Product ID required".to_owned()))
}

/// Both fields are required; a missing one is a validation failure, not a
/// default.
fn required_line(
    product_id: Option<i64>,
    quantity: Option<i64>,
) -> Result<(ProductId, i64), ApiError> {
    let (Some(product_id), Some(quantity)) = (product_id, quantity) else {
        return Err(ApiError::Validation(
            "Product ID and quantity required".to_owned(),
        ));
    };

    if quantity < 1 {
        return Err(ApiError::Validation(
            "Quantity must be at least 1".to_owned(),
        ));
    }

    Ok((ProductId::new(product_id), quantity))
}

async fn add(state: &AppState, session: &Session, body: &Bytes) -> Result<Response, ApiError> {
    let req: AddToCartRequest = parse_body(body)?;
    let (product_id, quantity) = required_line(req.product_id, req.quantity)?;

    let owner = resolve_cart_owner(session).await?;
    let cart = CartService::new(state.pool());

    let outcome = cart.add_item(&owner, product_id, quantity).await?;

    Ok(match outcome {
        AddToCartOutcome::Added => ok_message("Item added to cart"),
        AddToCartOutcome::Updated => ok_message("Cart updated"),
    })
}

async fn get(state: &AppState, session: &Session) -> Result<Response, ApiError> {
    let owner = resolve_cart_owner(session).await?;
    let cart = CartService::new(state.pool());

    let lines = cart.get_cart(&owner).await?;
    let total: Decimal = lines.iter().map(CartLine::line_total).sum();
    let count: i64 = lines.iter().map(|line| line.quantity).sum();
    let items: Vec<CartLineView> = lines.iter().map(CartLineView::from).collect();

    Ok(Json(json!({
        "success": true,
        "items": items,
        "total": total,
        "count": count,
    }))
    .into_response())
}

async fn update(state: &AppState, session: &Session, body: &Bytes) -> Result<Response, ApiError> {
    let Some(user) = current_user(session).await? else {
        return Err(ApiError::Auth("Login required to update cart".to_owned()));
    };

    let req: UpdateQuantityRequest = parse_body(body)?;
    let (product_id, quantity) = required_line(req.product_id, req.quantity)?;

    let cart = CartService::new(state.pool());
    cart.update_quantity(&CartOwner::User(user.id), product_id, quantity)
        .await?;

    Ok(ok_message("Cart updated successfully"))
}

async fn remove(
    state: &AppState,
    session: &Session,
    product_id: Option<i64>,
) -> Result<Response, ApiError> {
    let Some(user) = current_user(session).await? else {
        return Err(ApiError::Auth("Login required to update cart".to_owned()));
    };

    let product_id = required_product_id(product_id)?;

    let cart = CartService::new(state.pool());
    cart.remove_item(&CartOwner::User(user.id), product_id)
        .await?;

    Ok(ok_message("Item removed from cart"))
}

async fn clear(state: &AppState, session: &Session) -> Result<Response, ApiError> {
    let owner = resolve_cart_owner(session).await?;

    let cart = CartService::new(state.pool());
    cart.clear(&owner).await?;

    Ok(ok_message("Cart cleared"))
}

async fn count(state: &AppState, session: &Session) -> Result<Response, ApiError> {
    let owner = resolve_cart_owner(session).await?;

    let cart = CartService::new(state.pool());
    let count = cart.item_count(&owner).await?;

    Ok(Json(json!({ "success": true, "count": count })).into_response())
}
