//! Server-authoritative cart endpoints, keyed by shopper session.
//!
//! Every mutation loads the session's cart state, applies the aggregate
//! operation and saves the full state back (last-writer-wins across tabs).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{db_err, AppState};
use crate::domain::cart::{Cart, CartLineItem};
use crate::domain::money::Money;

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineItem>,
    pub is_open: bool,
    pub subtotal: Money,
    pub total: Money,
    pub item_count: u32,
}

impl CartResponse {
    fn from_cart(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            is_open: cart.is_open(),
            subtotal: cart.subtotal(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

pub async fn get(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let cart = s.store.load_cart(&session).await.map_err(db_err)?;
    Ok(Json(CartResponse::from_cart(&cart)))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Option<i64>,
}

pub async fn add_item(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), (StatusCode, String)> {
    let product = s
        .store
        .get_product(r.product_id)
        .await
        .map_err(db_err)?
        .filter(|p| p.is_active)
        .ok_or((StatusCode::NOT_FOUND, "Producto no encontrado".to_string()))?;

    let variant = match r.variant_id {
        Some(variant_id) => {
            let v = s
                .store
                .get_variant(variant_id)
                .await
                .map_err(db_err)?
                .filter(|v| v.is_active && v.product_id == product.id)
                .ok_or((StatusCode::NOT_FOUND, "Variante no encontrada".to_string()))?;
            Some(v)
        }
        None => None,
    };

    let mut cart = s.store.load_cart(&session).await.map_err(db_err)?;
    cart.add_item(&product, r.quantity.unwrap_or(1), variant.as_ref());
    s.store.save_cart(&session, &cart).await.map_err(db_err)?;
    tracing::debug!(%session, product = %product.name, "item added to cart");
    Ok((StatusCode::CREATED, Json(CartResponse::from_cart(&cart))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i64,
}

pub async fn update_quantity(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let mut cart = s.store.load_cart(&session).await.map_err(db_err)?;
    cart.update_quantity(r.product_id, r.quantity, r.variant_id);
    s.store.save_cart(&session, &cart).await.map_err(db_err)?;
    Ok(Json(CartResponse::from_cart(&cart)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
}

pub async fn remove_item(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<RemoveItemRequest>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let mut cart = s.store.load_cart(&session).await.map_err(db_err)?;
    cart.remove_item(r.product_id, r.variant_id);
    s.store.save_cart(&session, &cart).await.map_err(db_err)?;
    Ok(Json(CartResponse::from_cart(&cart)))
}

pub async fn clear(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    s.store.delete_cart(&session).await.map_err(db_err)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let mut cart = s.store.load_cart(&session).await.map_err(db_err)?;
    cart.toggle();
    s.store.save_cart(&session, &cart).await.map_err(db_err)?;
    Ok(Json(CartResponse::from_cart(&cart)))
}
