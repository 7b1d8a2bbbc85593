//! Coupon records and the discount evaluator.
//!
//! Validation short-circuits at the first failure and the order of checks is
//! part of the contract (it drives the user-facing message): active, expiry
//! window, minimum purchase, usage limit, per-user usage. Only then is the
//! discount computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    /// Uppercase identity; lookups normalize through [`normalize_code`].
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    /// Percent in `(0, 100]` for percentage coupons, whole pesos for fixed
    /// ones. Validated at creation time; evaluation trusts it.
    pub discount_value: i64,
    pub min_purchase: Money,
    /// Cap for percentage discounts only.
    pub max_discount: Option<Money>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    pub is_active: bool,
    pub free_shipping: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a successful evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountResult {
    pub discount_amount: Money,
    pub has_free_shipping: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Cupón no encontrado o inválido")]
    NotFound,
    #[error("Cupón expirado")]
    Expired,
    #[error("Cupón no válido aún")]
    NotYetValid,
    #[error("El pedido mínimo para usar este cupón es de {minimum} (te faltan {shortfall})")]
    BelowMinimum { minimum: Money, shortfall: Money },
    #[error("Este cupón ha alcanzado su límite de uso")]
    UsageLimitReached,
    #[error("Ya has usado este cupón anteriormente")]
    AlreadyUsedByUser,
    /// The lookup collaborator failed; distinct from a business rejection.
    #[error("No se pudo verificar el cupón: {0}")]
    LookupFailed(String),
}

/// Canonical form of a coupon code: trimmed and uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Decides redeemability against a cart subtotal and computes the
    /// discount.
    ///
    /// `already_used_by_user` is the per-user usage collaborator's answer;
    /// pass `false` for anonymous evaluation (the check is skipped when no
    /// email was supplied).
    pub fn evaluate(
        &self,
        cart_subtotal: Money,
        now: DateTime<Utc>,
        already_used_by_user: bool,
    ) -> Result<DiscountResult, CouponError> {
        if !self.is_active {
            return Err(CouponError::NotFound);
        }
        if let Some(until) = self.valid_until {
            if until < now {
                return Err(CouponError::Expired);
            }
        }
        if let Some(from) = self.valid_from {
            if from > now {
                return Err(CouponError::NotYetValid);
            }
        }
        if cart_subtotal < self.min_purchase {
            return Err(CouponError::BelowMinimum {
                minimum: self.min_purchase,
                shortfall: self.min_purchase.saturating_sub(cart_subtotal),
            });
        }
        if let Some(limit) = self.usage_limit {
            if self.times_used >= limit {
                return Err(CouponError::UsageLimitReached);
            }
        }
        if already_used_by_user {
            return Err(CouponError::AlreadyUsedByUser);
        }

        let discount_amount = match self.discount_type {
            DiscountType::Percentage => {
                let raw = cart_subtotal.percent(self.discount_value);
                match self.max_discount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            // A fixed discount can never exceed the amount being discounted.
            DiscountType::Fixed => Money::cop(self.discount_value).min(cart_subtotal),
        };

        // A discount covering the whole order counts as free shipping for
        // display purposes, matching the storefront's behavior.
        let has_free_shipping = self.free_shipping || discount_amount >= cart_subtotal;

        Ok(DiscountResult {
            discount_amount,
            has_free_shipping,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn coupon(discount_type: DiscountType, discount_value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE20".into(),
            description: "Descuento de prueba".into(),
            discount_type,
            discount_value,
            min_purchase: Money::ZERO,
            max_discount: None,
            valid_from: None,
            valid_until: None,
            usage_limit: None,
            times_used: 0,
            is_active: true,
            free_shipping: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save20 "), "SAVE20");
        assert_eq!(normalize_code("Bienvenido"), "BIENVENIDO");
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, 20);
        let r = c.evaluate(Money::cop(50000), Utc::now(), false).unwrap();
        assert_eq!(r.discount_amount, Money::cop(10000));
        assert!(!r.has_free_shipping);
    }

    #[test]
    fn test_percentage_clamped_to_max_discount() {
        let mut c = coupon(DiscountType::Percentage, 20);
        c.max_discount = Some(Money::cop(5000));
        let r = c.evaluate(Money::cop(50000), Utc::now(), false).unwrap();
        assert_eq!(r.discount_amount, Money::cop(5000));
    }

    #[test]
    fn test_percentage_below_cap_not_clamped() {
        let mut c = coupon(DiscountType::Percentage, 10);
        c.max_discount = Some(Money::cop(5000));
        let r = c.evaluate(Money::cop(20000), Utc::now(), false).unwrap();
        assert_eq!(r.discount_amount, Money::cop(2000));
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let c = coupon(DiscountType::Fixed, 10000);
        let r = c.evaluate(Money::cop(7000), Utc::now(), false).unwrap();
        assert_eq!(r.discount_amount, Money::cop(7000));
        // Full-cover discount implies free shipping.
        assert!(r.has_free_shipping);
    }

    #[test]
    fn test_discount_bounds_hold() {
        for (ty, value, subtotal) in [
            (DiscountType::Percentage, 100, 43210),
            (DiscountType::Percentage, 1, 99),
            (DiscountType::Fixed, 1, 1),
            (DiscountType::Fixed, 999999, 50),
        ] {
            let c = coupon(ty, value);
            let r = c.evaluate(Money::cop(subtotal), Utc::now(), false).unwrap();
            assert!(r.discount_amount >= Money::ZERO);
            assert!(r.discount_amount <= Money::cop(subtotal));
        }
    }

    #[test]
    fn test_free_shipping_flag_carries_through() {
        let mut c = coupon(DiscountType::Percentage, 5);
        c.free_shipping = true;
        let r = c.evaluate(Money::cop(50000), Utc::now(), false).unwrap();
        assert!(r.has_free_shipping);
    }

    #[test]
    fn test_inactive_is_not_found() {
        let mut c = coupon(DiscountType::Fixed, 1000);
        c.is_active = false;
        let err = c.evaluate(Money::cop(50000), Utc::now(), false).unwrap_err();
        assert_eq!(err, CouponError::NotFound);
    }

    #[test]
    fn test_expired_wins_over_other_checks() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 1000);
        c.valid_until = Some(now - Duration::days(1));
        c.min_purchase = Money::cop(999999);
        c.usage_limit = Some(1);
        c.times_used = 1;
        let err = c.evaluate(Money::cop(100), now, true).unwrap_err();
        assert_eq!(err, CouponError::Expired);
    }

    #[test]
    fn test_not_yet_valid() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 1000);
        c.valid_from = Some(now + Duration::days(1));
        let err = c.evaluate(Money::cop(50000), now, false).unwrap_err();
        assert_eq!(err, CouponError::NotYetValid);
    }

    #[test]
    fn test_open_ended_window_is_valid() {
        let c = coupon(DiscountType::Fixed, 1000);
        assert!(c.evaluate(Money::cop(50000), Utc::now(), false).is_ok());
    }

    #[test]
    fn test_below_minimum_reports_shortfall() {
        let mut c = coupon(DiscountType::Percentage, 10);
        c.min_purchase = Money::cop(30000);
        let err = c.evaluate(Money::cop(20000), Utc::now(), false).unwrap_err();
        assert_eq!(
            err,
            CouponError::BelowMinimum {
                minimum: Money::cop(30000),
                shortfall: Money::cop(10000),
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("$30.000"));
    }

    #[test]
    fn test_subtotal_equal_to_minimum_passes() {
        let mut c = coupon(DiscountType::Percentage, 10);
        c.min_purchase = Money::cop(30000);
        assert!(c.evaluate(Money::cop(30000), Utc::now(), false).is_ok());
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut c = coupon(DiscountType::Fixed, 1000);
        c.usage_limit = Some(5);
        c.times_used = 5;
        let err = c.evaluate(Money::cop(50000), Utc::now(), false).unwrap_err();
        assert_eq!(err, CouponError::UsageLimitReached);
    }

    #[test]
    fn test_usage_limit_with_remaining_uses_passes() {
        let mut c = coupon(DiscountType::Fixed, 1000);
        c.usage_limit = Some(5);
        c.times_used = 4;
        assert!(c.evaluate(Money::cop(50000), Utc::now(), false).is_ok());
    }

    #[test]
    fn test_already_used_by_user() {
        let c = coupon(DiscountType::Fixed, 1000);
        let err = c.evaluate(Money::cop(50000), Utc::now(), true).unwrap_err();
        assert_eq!(err, CouponError::AlreadyUsedByUser);
    }
}
