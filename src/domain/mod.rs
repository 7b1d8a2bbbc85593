//! Domain module: pure business logic, no I/O.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupon;
pub mod money;
pub mod shipping;

pub use cart::{Cart, CartLineItem, CartSnapshot};
pub use catalog::{Product, ProductVariant};
pub use checkout::CartTotals;
pub use coupon::{Coupon, CouponError, DiscountResult, DiscountType};
pub use money::Money;
pub use shipping::{ShippingQuote, ShippingRule};
