//! Tus Aguacates - Grocery Storefront Commerce Service
//!
//! Server-side commerce core for a direct-to-consumer grocery storefront:
//! - Shopping cart with per-session persistence
//! - Coupon validation and discount calculation
//! - Flat-rate shipping with a free-shipping threshold
//! - Guest checkout composing cart, coupon and shipping into an order

pub mod api;
pub mod config;
pub mod domain;
pub mod store;
