//! Final order totals.
//!
//! Checkout composes the three independently computed figures: the cart
//! subtotal, the coupon discount and the shipping quote. Discount and
//! shipping are never nested into each other.

use serde::{Deserialize, Serialize};

use crate::domain::coupon::DiscountResult;
use crate::domain::money::Money;
use crate::domain::shipping::ShippingQuote;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CartTotals {
    /// `total = max(0, subtotal - discount + shipping)`.
    ///
    /// A coupon granting free shipping zeroes the shipping component.
    pub fn compose(
        subtotal: Money,
        discount: Option<&DiscountResult>,
        quote: &ShippingQuote,
    ) -> Self {
        let discount_amount = discount.map(|d| d.discount_amount).unwrap_or(Money::ZERO);
        let shipping = match discount {
            Some(d) if d.has_free_shipping => Money::ZERO,
            _ => quote.cost,
        };
        Self {
            subtotal,
            discount: discount_amount,
            shipping,
            total: subtotal.saturating_sub(discount_amount).add(shipping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipping::ShippingRule;

    #[test]
    fn test_totals_without_coupon() {
        let quote = ShippingRule::default().quote(Money::cop(30000));
        let t = CartTotals::compose(Money::cop(30000), None, &quote);
        assert_eq!(t.discount, Money::ZERO);
        assert_eq!(t.shipping, Money::cop(7400));
        assert_eq!(t.total, Money::cop(37400));
    }

    #[test]
    fn test_discount_subtracted_before_shipping_added() {
        let quote = ShippingRule::default().quote(Money::cop(50000));
        let d = DiscountResult {
            discount_amount: Money::cop(5000),
            has_free_shipping: false,
        };
        let t = CartTotals::compose(Money::cop(50000), Some(&d), &quote);
        assert_eq!(t.total, Money::cop(50000 - 5000 + 7400));
    }

    #[test]
    fn test_free_shipping_coupon_zeroes_shipping() {
        let quote = ShippingRule::default().quote(Money::cop(20000));
        let d = DiscountResult {
            discount_amount: Money::cop(2000),
            has_free_shipping: true,
        };
        let t = CartTotals::compose(Money::cop(20000), Some(&d), &quote);
        assert_eq!(t.shipping, Money::ZERO);
        assert_eq!(t.total, Money::cop(18000));
    }

    #[test]
    fn test_cart_to_order_flow() {
        use crate::domain::cart::Cart;
        use crate::domain::catalog::tests::product;
        use crate::domain::coupon::tests::coupon;
        use crate::domain::coupon::DiscountType;
        use chrono::Utc;

        let avocado = product(6500, None);
        let limes = product(4200, Some(3900));
        let mut cart = Cart::new();
        cart.add_item(&avocado, 4, None);
        cart.add_item(&limes, 2, None);
        let snapshot = cart.snapshot();
        assert_eq!(snapshot.subtotal, Money::cop(4 * 6500 + 2 * 3900));

        let mut c = coupon(DiscountType::Percentage, 10);
        c.min_purchase = Money::cop(20000);
        let result = c.evaluate(snapshot.subtotal, Utc::now(), false).unwrap();

        let quote = ShippingRule::default().quote(snapshot.subtotal);
        let totals = CartTotals::compose(snapshot.subtotal, Some(&result), &quote);
        assert_eq!(totals.subtotal, Money::cop(33800));
        assert_eq!(totals.discount, Money::cop(3380));
        assert_eq!(totals.shipping, Money::cop(7400));
        assert_eq!(totals.total, Money::cop(33800 - 3380 + 7400));
    }

    #[test]
    fn test_full_cover_discount_never_goes_negative() {
        let quote = ShippingRule::default().quote(Money::cop(7000));
        let d = DiscountResult {
            discount_amount: Money::cop(7000),
            has_free_shipping: true,
        };
        let t = CartTotals::compose(Money::cop(7000), Some(&d), &quote);
        assert_eq!(t.total, Money::ZERO);
    }
}
