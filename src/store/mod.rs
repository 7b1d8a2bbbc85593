//! Persistence over Postgres.
//!
//! The cart is stored as one jsonb row per shopper session (opaque
//! save/load, last-writer-wins across tabs and devices). Coupon redemption
//! happens inside the order transaction with a conditional increment so a
//! limited coupon can never be redeemed past its usage limit, even under
//! concurrent checkouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartSnapshot};
use crate::domain::checkout::CartTotals;
use crate::domain::catalog::{Product, ProductVariant};
use crate::domain::coupon::{Coupon, CouponError, DiscountType};
use crate::domain::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: String,
    pub status: String,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
    pub coupon_code: Option<String>,
    pub shipping_address: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub total: Money,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Coupon(#[from] CouponError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct NewCoupon {
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase: Money,
    pub max_discount: Option<Money>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub free_shipping: bool,
}

pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub unit: String,
    pub stock: Option<i32>,
    pub main_image_url: Option<String>,
}

#[derive(Clone)]
pub struct Store {
    db: PgPool,
}

impl Store {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Cart persistence: save(CartState) / load() keyed by session
    // ------------------------------------------------------------------

    pub async fn load_cart(&self, session_id: &str) -> sqlx::Result<Cart> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT state FROM carts WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.db)
                .await?;
        match row {
            Some((state,)) => {
                serde_json::from_value(state).map_err(|e| sqlx::Error::Decode(Box::new(e)))
            }
            None => Ok(Cart::new()),
        }
    }

    pub async fn save_cart(&self, session_id: &str, cart: &Cart) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO carts (session_id, state, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (session_id) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
        )
        .bind(session_id)
        .bind(Json(cart))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn delete_cart(&self, session_id: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM carts WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub async fn list_products(
        &self,
        page: u32,
        per_page: u32,
    ) -> sqlx::Result<(Vec<Product>, i64)> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(per_page))
        .bind(i64::from((page - 1) * per_page))
        .fetch_all(&self.db)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active")
            .fetch_one(&self.db)
            .await?;
        Ok((products, total.0))
    }

    pub async fn get_product(&self, id: Uuid) -> sqlx::Result<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn product_variants(&self, product_id: Uuid) -> sqlx::Result<Vec<ProductVariant>> {
        sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = $1 AND is_active \
             ORDER BY variant_name, variant_value",
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn get_variant(&self, id: Uuid) -> sqlx::Result<Option<ProductVariant>> {
        sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn create_product(&self, p: NewProduct) -> sqlx::Result<Product> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products \
             (id, name, slug, description, price, discount_price, unit, stock, main_image_url, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&p.name)
        .bind(&p.slug)
        .bind(&p.description)
        .bind(p.price)
        .bind(p.discount_price)
        .bind(&p.unit)
        .bind(p.stock)
        .bind(&p.main_image_url)
        .fetch_one(&self.db)
        .await
    }

    pub async fn update_product(&self, id: Uuid, p: NewProduct) -> sqlx::Result<Option<Product>> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, \
             discount_price = $6, unit = $7, stock = $8, main_image_url = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&p.name)
        .bind(&p.slug)
        .bind(&p.description)
        .bind(p.price)
        .bind(p.discount_price)
        .bind(&p.unit)
        .bind(p.stock)
        .bind(&p.main_image_url)
        .fetch_optional(&self.db)
        .await
    }

    // ------------------------------------------------------------------
    // Coupons
    // ------------------------------------------------------------------

    /// Looks up an active coupon by its already-normalized (uppercase) code.
    pub async fn find_active_coupon(&self, code: &str) -> sqlx::Result<Option<Coupon>> {
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1 AND is_active")
            .bind(code)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn user_has_redeemed(&self, coupon_id: Uuid, email: &str) -> sqlx::Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM coupon_usage WHERE coupon_id = $1 AND user_email = $2",
        )
        .bind(coupon_id)
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.is_some())
    }

    pub async fn create_coupon(&self, c: NewCoupon) -> sqlx::Result<Coupon> {
        sqlx::query_as::<_, Coupon>(
            "INSERT INTO coupons \
             (id, code, description, discount_type, discount_value, min_purchase, max_discount, \
              valid_from, valid_until, usage_limit, times_used, is_active, free_shipping, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, TRUE, $11, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&c.code)
        .bind(&c.description)
        .bind(c.discount_type)
        .bind(c.discount_value)
        .bind(c.min_purchase)
        .bind(c.max_discount)
        .bind(c.valid_from)
        .bind(c.valid_until)
        .bind(c.usage_limit)
        .bind(c.free_shipping)
        .fetch_one(&self.db)
        .await
    }

    pub async fn list_coupons(&self) -> sqlx::Result<Vec<Coupon>> {
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC")
            .fetch_all(&self.db)
            .await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Persists the order with its items, redeems the coupon and clears the
    /// session cart, all in one transaction.
    ///
    /// The coupon increment is conditional on the usage limit, so the last
    /// remaining use cannot be handed out twice by concurrent checkouts.
    #[allow(clippy::too_many_arguments)]
    pub async fn place_order(
        &self,
        session_id: &str,
        snapshot: &CartSnapshot,
        totals: CartTotals,
        customer_email: &str,
        customer_name: &str,
        shipping_address: serde_json::Value,
        coupon: Option<&Coupon>,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.db.begin().await?;

        let order_number = format!(
            "ORD-{}",
            &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders \
             (id, order_number, customer_email, customer_name, status, subtotal, discount, \
              shipping, total, coupon_code, shipping_address, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9, $10, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&order_number)
        .bind(customer_email)
        .bind(customer_name)
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.shipping)
        .bind(totals.total)
        .bind(coupon.map(|c| c.code.as_str()))
        .bind(&shipping_address)
        .fetch_one(&mut *tx)
        .await?;

        for line in &snapshot.line_items {
            sqlx::query(
                "INSERT INTO order_items \
                 (id, order_id, product_id, variant_id, name, quantity, unit_price, total) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::now_v7())
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.variant_id)
            .bind(&line.name)
            .bind(line.quantity as i32)
            .bind(line.unit_price)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(coupon) = coupon {
            let updated = sqlx::query(
                "UPDATE coupons SET times_used = times_used + 1, updated_at = NOW() \
                 WHERE id = $1 AND is_active \
                 AND (usage_limit IS NULL OR times_used < usage_limit)",
            )
            .bind(coupon.id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(CouponError::UsageLimitReached.into());
            }

            let recorded = sqlx::query(
                "INSERT INTO coupon_usage (id, coupon_id, user_email, order_id, used_at) \
                 VALUES ($1, $2, $3, $4, NOW()) \
                 ON CONFLICT (coupon_id, user_email) DO NOTHING",
            )
            .bind(Uuid::now_v7())
            .bind(coupon.id)
            .bind(customer_email.trim().to_lowercase())
            .bind(order.id)
            .execute(&mut *tx)
            .await?;
            if recorded.rows_affected() == 0 {
                // Lost a race with another checkout by the same shopper.
                tx.rollback().await?;
                return Err(CouponError::AlreadyUsedByUser.into());
            }
        }

        sqlx::query("DELETE FROM carts WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_number = %order.order_number, total = %order.total, "order placed");
        Ok(order)
    }

    pub async fn list_orders(&self, page: u32, per_page: u32) -> sqlx::Result<(Vec<Order>, i64)> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(per_page))
        .bind(i64::from((page - 1) * per_page))
        .fetch_all(&self.db)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.db)
            .await?;
        Ok((orders, total.0))
    }

    pub async fn get_order(&self, id: Uuid) -> sqlx::Result<Option<(Order, Vec<OrderItem>)>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        match order {
            Some(order) => {
                let items = sqlx::query_as::<_, OrderItem>(
                    "SELECT * FROM order_items WHERE order_id = $1",
                )
                .bind(order.id)
                .fetch_all(&self.db)
                .await?;
                Ok(Some((order, items)))
            }
            None => Ok(None),
        }
    }
}
