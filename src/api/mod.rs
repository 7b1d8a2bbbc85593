//! HTTP surface of the service.

pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod shipping;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::shipping::ShippingRule;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub shipping: ShippingRule,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "tus-aguacates"})) }),
        )
        .route("/api/v1/products", get(products::list).post(products::create))
        .route("/api/v1/products/:id", get(products::get).put(products::update))
        .route("/api/v1/cart/:session", get(cart::get).delete(cart::clear))
        .route(
            "/api/v1/cart/:session/items",
            post(cart::add_item).put(cart::update_quantity).delete(cart::remove_item),
        )
        .route("/api/v1/cart/:session/toggle", post(cart::toggle))
        .route("/api/v1/coupons/validate", get(coupons::validate))
        .route("/api/v1/admin/coupons", get(coupons::list).post(coupons::create))
        .route("/api/v1/shipping/calculate", post(shipping::calculate))
        .route("/api/v1/checkout", post(checkout::checkout))
        .route("/api/v1/orders", get(orders::list))
        .route("/api/v1/orders/:id", get(orders::get))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn db_err(e: sqlx::Error) -> (StatusCode, String) {
    tracing::error!(error = %e, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).min(100)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}
