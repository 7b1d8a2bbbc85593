//! Catalog endpoints: storefront reads plus the admin create/update pair.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{db_err, AppState, ListParams, PaginatedResponse};
use crate::domain::catalog::{Product, ProductVariant};
use crate::domain::money::Money;
use crate::store::NewProduct;

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, (StatusCode, String)> {
    let (products, total) = s
        .store
        .list_products(p.page(), p.per_page())
        .await
        .map_err(db_err)?;
    Ok(Json(PaginatedResponse {
        data: products,
        total,
        page: p.page(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

pub async fn get(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, (StatusCode, String)> {
    let product = s
        .store
        .get_product(id)
        .await
        .map_err(db_err)?
        .ok_or((StatusCode::NOT_FOUND, "Producto no encontrado".to_string()))?;
    let variants = s.store.product_variants(id).await.map_err(db_err)?;
    Ok(Json(ProductResponse { product, variants }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub discount_price: Option<i64>,
    pub unit: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub main_image_url: Option<String>,
}

impl ProductRequest {
    fn into_new_product(self) -> NewProduct {
        let slug = self.name.to_lowercase().replace(' ', "-");
        NewProduct {
            name: self.name,
            slug,
            description: self.description,
            price: Money::cop(self.price),
            discount_price: self.discount_price.map(Money::cop),
            unit: self.unit.unwrap_or_else(|| "unidad".to_string()),
            stock: self.stock,
            main_image_url: self.main_image_url,
        }
    }
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), (StatusCode, String)> {
    r.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let product = s
        .store
        .create_product(r.into_new_product())
        .await
        .map_err(db_err)?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<ProductRequest>,
) -> Result<Json<Product>, (StatusCode, String)> {
    r.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let product = s
        .store
        .update_product(id, r.into_new_product())
        .await
        .map_err(db_err)?
        .ok_or((StatusCode::NOT_FOUND, "Producto no encontrado".to_string()))?;
    Ok(Json(product))
}
