//! Guest checkout: composes cart, coupon and shipping into an order.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::coupons::evaluate_code;
use super::{db_err, AppState};
use crate::domain::checkout::CartTotals;
use crate::domain::coupon::CouponError;
use crate::store::{CheckoutError, Order};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    pub shipping_address: Option<serde_json::Value>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub totals: CartTotals,
}

pub async fn checkout(
    State(s): State<AppState>,
    Json(r): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), (StatusCode, String)> {
    r.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let cart = s.store.load_cart(&r.session_id).await.map_err(db_err)?;
    if cart.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "El carrito está vacío".to_string()));
    }
    let snapshot = cart.snapshot();

    let evaluated = match r.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => {
            let (coupon, result) = evaluate_code(
                &s.store,
                code,
                snapshot.subtotal,
                Some(&r.customer_email),
            )
            .await
            .map_err(coupon_err)?;
            Some((coupon, result))
        }
        None => None,
    };

    let quote = s.shipping.quote(snapshot.subtotal);
    let totals = CartTotals::compose(
        snapshot.subtotal,
        evaluated.as_ref().map(|(_, result)| result),
        &quote,
    );

    let order = s
        .store
        .place_order(
            &r.session_id,
            &snapshot,
            totals,
            &r.customer_email,
            &r.customer_name,
            r.shipping_address.unwrap_or(serde_json::Value::Null),
            evaluated.as_ref().map(|(coupon, _)| coupon),
        )
        .await
        .map_err(|e| match e {
            CheckoutError::Coupon(e) => coupon_err(e),
            CheckoutError::Db(e) => db_err(e),
        })?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse { order, totals })))
}

fn coupon_err(e: CouponError) -> (StatusCode, String) {
    match e {
        CouponError::LookupFailed(detail) => {
            tracing::error!(error = %detail, "coupon lookup failed during checkout");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "No se pudo verificar el cupón".to_string(),
            )
        }
        e => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}
