//! Product routes.

use super::{ApiResult, AppState, require_admin};
use crate::{
    core::{
        catalog::{self, CatalogEntry, ProductFilter, ProductInput},
        ordering::{self, OrderUpdate},
    },
    entities::product,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Query string of `GET /api/products`
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    search: Option<String>,
    available: Option<String>,
}

/// Body of `POST /api/products` and `PUT /api/products/:id`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    name: String,
    price: f64,
    #[serde(rename = "pricePer100gm")]
    price_per_100gm: Option<f64>,
    weight: Option<f64>,
    weight_unit: Option<String>,
    image: Option<String>,
    company: Option<String>,
    is_available: Option<bool>,
    offer_id: Option<String>,
}

impl From<ProductRequest> for ProductInput {
    fn from(request: ProductRequest) -> Self {
        Self {
            name: request.name,
            price: request.price,
            price_per_100gm: request.price_per_100gm,
            weight: request.weight,
            weight_unit: request.weight_unit,
            image: request.image,
            company: request.company,
            is_available: request.is_available.unwrap_or(true),
            offer_id: request.offer_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

/// Body of `POST /api/products/reorder`
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    products: Vec<OrderUpdate>,
}

/// `GET /api/products` - priced catalog in display order
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let filter = ProductFilter {
        search: query.search,
        available_only: query.available.as_deref() == Some("true"),
    };
    let rows = catalog::list_products(&state.db, &filter).await?;
    Ok(Json(catalog::price_catalog(rows, state.clock.as_ref())))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<product::Model>)> {
    require_admin(&state, &headers).await?;
    let product = catalog::create_product(&state.db, request.into(), state.clock.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/:id`
pub async fn update_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<ProductRequest>,
) -> ApiResult<Json<product::Model>> {
    require_admin(&state, &headers).await?;
    let product =
        catalog::update_product(&state.db, &id, request.into(), state.clock.as_ref()).await?;
    Ok(Json(product))
}

/// `DELETE /api/products/:id`
pub async fn delete_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers).await?;
    catalog::delete_product(&state.db, &id).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/products/reorder` - applies the whole batch or none of it
pub async fn reorder_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers).await?;
    ordering::reorder_products(&state.db, &request.products).await?;
    Ok(Json(json!({ "success": true })))
}
