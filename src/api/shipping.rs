//! Shipping quote endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::domain::money::Money;

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub subtotal: i64,
    pub location: Option<String>,
}

pub async fn calculate(
    State(s): State<AppState>,
    Json(r): Json<CalculateRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if r.subtotal < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Subtotal no puede ser negativo".to_string(),
        ));
    }
    let quote = s.shipping.quote(Money::cop(r.subtotal));
    Ok(Json(serde_json::json!({
        "success": true,
        "shipping": {
            "cost": quote.cost,
            "freeShipping": quote.free_shipping,
            "freeShippingMin": quote.free_shipping_min,
            "amountForFreeShipping": quote.amount_for_free_shipping,
            "location": r.location.unwrap_or_else(|| "Bogotá".to_string()),
            "estimatedDays": quote.estimated_days,
            "message": quote.message,
        }
    })))
}
