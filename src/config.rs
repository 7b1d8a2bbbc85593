//! Environment-driven configuration.

use anyhow::{Context, Result};

use crate::domain::money::Money;
use crate::domain::shipping::ShippingRule;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub shipping: ShippingRule,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let mut shipping = ShippingRule::default();
        if let Some(v) = env_i64("SHIPPING_FLAT_COST") {
            shipping.flat_cost = Money::cop(v);
        }
        if let Some(v) = env_i64("FREE_SHIPPING_MIN") {
            shipping.free_over = Money::cop(v);
        }

        Ok(Self {
            database_url,
            port,
            shipping,
        })
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok()?.parse().ok()
}
