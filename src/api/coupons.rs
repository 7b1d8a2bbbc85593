//! Coupon validation (storefront) and administration.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use super::{db_err, AppState};
use crate::domain::coupon::{normalize_code, Coupon, CouponError, DiscountResult, DiscountType};
use crate::domain::money::Money;
use crate::store::{NewCoupon, Store};

/// Lookup + per-user usage check + evaluation, sequenced the way the
/// evaluator requires. Shared by the validate endpoint and checkout.
pub(crate) async fn evaluate_code(
    store: &Store,
    code: &str,
    cart_subtotal: Money,
    user_email: Option<&str>,
) -> Result<(Coupon, DiscountResult), CouponError> {
    let code = normalize_code(code);
    let coupon = store
        .find_active_coupon(&code)
        .await
        .map_err(|e| CouponError::LookupFailed(e.to_string()))?
        .ok_or(CouponError::NotFound)?;

    let already_used = match user_email.map(str::trim) {
        Some(email) if !email.is_empty() => store
            .user_has_redeemed(coupon.id, email)
            .await
            .map_err(|e| CouponError::LookupFailed(e.to_string()))?,
        _ => false,
    };

    let result = coupon.evaluate(cart_subtotal, Utc::now(), already_used)?;
    Ok((coupon, result))
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub code: Option<String>,
    #[serde(rename = "cartTotal")]
    pub cart_total: Option<i64>,
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
}

pub async fn validate(
    State(s): State<AppState>,
    Query(p): Query<ValidateParams>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let code = p
        .code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Código de cupón requerido".to_string()))?;
    let cart_total = p.cart_total.unwrap_or(0);
    if cart_total < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "El total del carrito no puede ser negativo".to_string(),
        ));
    }

    match evaluate_code(&s.store, code, Money::cop(cart_total), p.user_email.as_deref()).await {
        Ok((coupon, result)) => Ok(Json(serde_json::json!({
            "success": true,
            "coupon": {
                "id": coupon.id,
                "code": coupon.code,
                "description": coupon.description,
                "discount_type": coupon.discount_type,
                "discount_value": coupon.discount_value,
                "discount_amount": result.discount_amount,
                "min_purchase": coupon.min_purchase,
                "free_shipping": coupon.free_shipping,
                "hasFreeShipping": result.has_free_shipping,
            },
            "message": "Cupón válido",
        }))),
        Err(CouponError::LookupFailed(e)) => {
            tracing::error!(error = %e, "coupon lookup failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "No se pudo verificar el cupón".to_string(),
            ))
        }
        Err(e) => Ok(Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
        }))),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 3, max = 30))]
    pub code: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 1))]
    pub discount_value: i64,
    #[validate(range(min = 0))]
    pub min_purchase: Option<i64>,
    #[validate(range(min = 1))]
    pub max_discount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    pub free_shipping: Option<bool>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), (StatusCode, String)> {
    r.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    // Creation time is the trust boundary for the discount value; evaluation
    // does not re-check it.
    if r.discount_type == DiscountType::Percentage && r.discount_value > 100 {
        return Err((
            StatusCode::BAD_REQUEST,
            "El descuento porcentual no puede ser mayor a 100%".to_string(),
        ));
    }
    let valid_from = r.valid_from.unwrap_or_else(Utc::now);
    if let Some(until) = r.valid_until {
        if valid_from >= until {
            return Err((
                StatusCode::BAD_REQUEST,
                "La fecha de inicio debe ser anterior a la de expiración".to_string(),
            ));
        }
    }

    let coupon = s
        .store
        .create_coupon(NewCoupon {
            code: normalize_code(&r.code),
            description: r.description,
            discount_type: r.discount_type,
            discount_value: r.discount_value,
            min_purchase: Money::cop(r.min_purchase.unwrap_or(0)),
            max_discount: r.max_discount.map(Money::cop),
            valid_from,
            valid_until: r.valid_until,
            usage_limit: r.usage_limit,
            free_shipping: r.free_shipping.unwrap_or(false),
        })
        .await
        .map_err(db_err)?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

pub async fn list(
    State(s): State<AppState>,
) -> Result<Json<Vec<Coupon>>, (StatusCode, String)> {
    let coupons = s.store.list_coupons().await.map_err(db_err)?;
    Ok(Json(coupons))
}
