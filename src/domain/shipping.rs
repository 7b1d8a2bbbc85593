//! Flat-rate shipping with a free-shipping threshold.
//!
//! One rule applies storewide; per-zone rules were deliberately retired in
//! favor of a single configured threshold. Free shipping kicks in when the
//! subtotal is strictly greater than the threshold.

use serde::{Deserialize, Serialize};

use crate::domain::money::Money;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShippingRule {
    pub flat_cost: Money,
    pub free_over: Money,
}

impl Default for ShippingRule {
    fn default() -> Self {
        Self {
            flat_cost: Money::cop(7400),
            free_over: Money::cop(68900),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub cost: Money,
    pub free_shipping: bool,
    pub free_shipping_min: Money,
    pub amount_for_free_shipping: Money,
    pub estimated_days: u32,
    pub message: String,
}

impl ShippingRule {
    pub fn quote(&self, subtotal: Money) -> ShippingQuote {
        let free_shipping = subtotal > self.free_over;
        ShippingQuote {
            cost: if free_shipping { Money::ZERO } else { self.flat_cost },
            free_shipping,
            free_shipping_min: self.free_over,
            amount_for_free_shipping: if free_shipping {
                Money::ZERO
            } else {
                self.free_over.saturating_sub(subtotal)
            },
            estimated_days: if free_shipping { 2 } else { 1 },
            message: if free_shipping {
                "¡Envío GRATIS en tu pedido!".to_string()
            } else {
                format!("Envío: {}", self.flat_cost)
            },
        }
    }
}
