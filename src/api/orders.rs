//! Order reads for the back office.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::{db_err, AppState, ListParams, PaginatedResponse};
use crate::store::{Order, OrderItem};

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Order>>, (StatusCode, String)> {
    let (orders, total) = s
        .store
        .list_orders(p.page(), p.per_page())
        .await
        .map_err(db_err)?;
    Ok(Json(PaginatedResponse {
        data: orders,
        total,
        page: p.page(),
    }))
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn get(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, (StatusCode, String)> {
    let (order, items) = s
        .store
        .get_order(id)
        .await
        .map_err(db_err)?
        .ok_or((StatusCode::NOT_FOUND, "Pedido no encontrado".to_string()))?;
    Ok(Json(OrderResponse { order, items }))
}
