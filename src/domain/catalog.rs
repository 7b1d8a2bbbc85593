//! Catalog read models: products and their variants.
//!
//! The cart treats these as read-only snapshots; writes go through the
//! admin endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    /// Sale price. Zero is treated as "no discount", not a free item.
    pub discount_price: Option<Money>,
    pub unit: String,
    /// `None` means availability is unconstrained.
    pub stock: Option<i32>,
    pub main_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A selectable option of a product, e.g. "Presentación" / "Caja de 12".
///
/// A variant price is an absolute override: when present (and non-zero) it
/// replaces the product's price and discount price entirely.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_name: String,
    pub variant_value: String,
    pub price: Option<Money>,
    pub stock_quantity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Effective per-unit price of the product itself, before any variant.
    ///
    /// The discount price applies only when it is non-zero and strictly
    /// below the base price.
    pub fn sale_price(&self) -> Money {
        match self.discount_price {
            Some(d) if !d.is_zero() && d < self.price => d,
            _ => self.price,
        }
    }

    pub fn is_on_sale(&self) -> bool {
        self.sale_price() < self.price
    }

    /// Resolves the unit price for a cart addition.
    ///
    /// Precedence: variant absolute price, then product discount price,
    /// then product base price.
    pub fn unit_price(&self, variant: Option<&ProductVariant>) -> Money {
        if let Some(v) = variant {
            if let Some(p) = v.price {
                if !p.is_zero() {
                    return p;
                }
            }
        }
        self.sale_price()
    }
}
