//! Cart aggregate.
//!
//! The cart owns the set of line items a shopper intends to purchase. Each
//! line is keyed by the composite identity `(product_id, variant_id)`;
//! repeated additions for the same identity merge into one line. Unit prices
//! are snapshotted at first-add time and never re-resolved.
//!
//! The aggregate does no I/O; persistence is the store layer's job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::{Product, ProductVariant};
use crate::domain::money::Money;

/// Read-only snapshot of the product a line item came from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub main_image_url: Option<String>,
}

/// Read-only snapshot of the selected variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantRef {
    pub id: Uuid,
    pub variant_name: String,
    pub variant_value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product: ProductRef,
    pub variant: Option<VariantRef>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    fn matches(&self, product_id: Uuid, variant_id: Option<Uuid>) -> bool {
        self.product.id == product_id && self.variant.as_ref().map(|v| v.id) == variant_id
    }
}

/// Flat cart view handed to checkout and API responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub line_items: Vec<LineItemSnapshot>,
    pub subtotal: Money,
    pub item_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItemSnapshot {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLineItem>,
    is_open: bool,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Adds `quantity` units of a product (optionally a specific variant).
    ///
    /// If a line with the same `(product_id, variant_id)` identity already
    /// exists, its quantity is incremented and its stored unit price is left
    /// untouched. Otherwise a new line is created with the price resolved by
    /// [`Product::unit_price`].
    ///
    /// A non-positive `quantity` is coerced to 1; adding something to the
    /// cart always means at least one unit.
    pub fn add_item(&mut self, product: &Product, quantity: i64, variant: Option<&ProductVariant>) {
        let quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        let variant_id = variant.map(|v| v.id);

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(product.id, variant_id))
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }

        self.items.push(CartLineItem {
            product: ProductRef {
                id: product.id,
                name: product.name.clone(),
                main_image_url: product.main_image_url.clone(),
            },
            variant: variant.map(|v| VariantRef {
                id: v.id,
                variant_name: v.variant_name.clone(),
                variant_value: v.variant_value.clone(),
            }),
            quantity,
            unit_price: product.unit_price(variant),
        });
    }

    /// Sets the quantity of a line to exactly `quantity`.
    ///
    /// A quantity of zero or less removes the line; that is the documented
    /// removal path, not an error. Absent identities are a no-op.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64, variant_id: Option<Uuid>) {
        if quantity <= 0 {
            self.remove_item(product_id, variant_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        {
            item.quantity = quantity;
        }
    }

    /// Removes the line with the given identity. No-op if absent.
    pub fn remove_item(&mut self, product_id: Uuid, variant_id: Option<Uuid>) {
        self.items.retain(|i| !i.matches(product_id, variant_id));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Flips the cart drawer flag. UI state only, no financial effect.
    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::ZERO, |acc, i| acc.add(i.line_total()))
    }

    /// Equal to the subtotal; coupon discount and shipping are composed on
    /// top by checkout, not here.
    pub fn total(&self) -> Money {
        self.subtotal()
    }

    /// Total units across all lines, not the number of distinct lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            line_items: self
                .items
                .iter()
                .map(|i| LineItemSnapshot {
                    product_id: i.product.id,
                    variant_id: i.variant.as_ref().map(|v| v.id),
                    name: i.product.name.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.line_total(),
                })
                .collect(),
            subtotal: self.subtotal(),
            item_count: self.item_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::tests::{product, variant};

    #[test]
    fn test_add_merges_same_identity() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.add_item(&p, 3, None);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), Money::cop(32500));
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let p = product(6500, None);
        let v = variant(p.id, Some(18000));
        let mut cart = Cart::new();
        cart.add_item(&p, 1, None);
        cart.add_item(&p, 1, Some(&v));
        cart.add_item(&p, 1, Some(&v));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.subtotal(), Money::cop(6500 + 2 * 18000));
    }

    #[test]
    fn test_discount_price_snapshotted() {
        let p = product(6500, Some(4500));
        let mut cart = Cart::new();
        cart.add_item(&p, 1, None);
        assert_eq!(cart.items()[0].unit_price, Money::cop(4500));
    }

    #[test]
    fn test_zero_discount_price_uses_base() {
        let p = product(6500, Some(0));
        let mut cart = Cart::new();
        cart.add_item(&p, 1, None);
        assert_eq!(cart.items()[0].unit_price, Money::cop(6500));
    }

    #[test]
    fn test_price_fixed_at_first_add() {
        let mut p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 1, None);
        p.price = Money::cop(9000);
        cart.add_item(&p, 1, None);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].unit_price, Money::cop(6500));
        assert_eq!(cart.subtotal(), Money::cop(13000));
    }

    #[test]
    fn test_nonpositive_add_quantity_coerced_to_one() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 0, None);
        assert_eq!(cart.items()[0].quantity, 1);
        cart.add_item(&p, -3, None);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_update_quantity_is_absolute() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.update_quantity(p.id, 7, None);
        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.update_quantity(p.id, 0, None);
        assert!(cart.is_empty());

        cart.add_item(&p, 2, None);
        cart.update_quantity(p.id, -5, None);
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_update_and_remove_absent_are_noops() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.update_quantity(Uuid::new_v4(), 5, None);
        cart.remove_item(Uuid::new_v4(), None);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_remove_targets_composite_identity() {
        let p = product(6500, None);
        let v = variant(p.id, Some(18000));
        let mut cart = Cart::new();
        cart.add_item(&p, 1, None);
        cart.add_item(&p, 1, Some(&v));
        cart.remove_item(p.id, Some(v.id));
        assert_eq!(cart.items().len(), 1);
        assert!(cart.items()[0].variant.is_none());
    }

    #[test]
    fn test_item_count_counts_units() {
        let p = product(6500, None);
        let other = product(3000, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 5, None);
        cart.add_item(&other, 2, None);
        assert_eq!(cart.item_count(), 7);
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_total_consistent_after_interleaved_ops() {
        let a = product(6500, None);
        let b = product(3000, Some(2500));
        let mut cart = Cart::new();
        cart.add_item(&a, 2, None);
        cart.add_item(&b, 4, None);
        cart.update_quantity(b.id, 1, None);
        cart.remove_item(a.id, None);
        cart.add_item(&a, 3, None);
        let expected: i64 = cart
            .items()
            .iter()
            .map(|i| i.unit_price.amount() * i64::from(i.quantity))
            .sum();
        assert_eq!(cart.total().amount(), expected);
        assert_eq!(cart.total(), Money::cop(3 * 6500 + 2500));
    }

    #[test]
    fn test_clear_empties_cart() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::ZERO);
    }

    #[test]
    fn test_toggle_does_not_touch_items() {
        let p = product(6500, None);
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        assert!(!cart.is_open());
        cart.toggle();
        assert!(cart.is_open());
        assert_eq!(cart.subtotal(), Money::cop(13000));
        cart.toggle();
        assert!(!cart.is_open());
    }

    #[test]
    fn test_snapshot_shape() {
        let p = product(6500, Some(4500));
        let mut cart = Cart::new();
        cart.add_item(&p, 3, None);
        let snap = cart.snapshot();
        assert_eq!(snap.line_items.len(), 1);
        assert_eq!(snap.line_items[0].unit_price, Money::cop(4500));
        assert_eq!(snap.line_items[0].line_total, Money::cop(13500));
        assert_eq!(snap.subtotal, Money::cop(13500));
        assert_eq!(snap.item_count, 3);
    }

    #[test]
    fn test_state_round_trips_through_serde() {
        let p = product(6500, None);
        let v = variant(p.id, Some(18000));
        let mut cart = Cart::new();
        cart.add_item(&p, 2, None);
        cart.add_item(&p, 1, Some(&v));
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.subtotal(), cart.subtotal());
        assert_eq!(restored.item_count(), 3);
    }
}
