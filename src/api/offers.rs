//! Offer routes.

use super::{ApiResult, AppState, require_admin};
use crate::{
    core::offer::{self, OfferDuration, OfferInput, OfferWindow},
    entities::{offer as offer_entity, product},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Body of `POST /api/offers` and `PUT /api/offers/:id`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    name: String,
    discount_percentage: f64,
    end_date: Option<String>,
    end_time: Option<String>,
    duration: Option<OfferDuration>,
    is_active: Option<bool>,
}

impl OfferRequest {
    fn input(&self) -> Result<OfferInput> {
        let end_time = self.end_time.as_deref().filter(|t| !t.trim().is_empty());
        Ok(OfferInput {
            name: self.name.clone(),
            discount_percentage: self.discount_percentage,
            window: OfferWindow::from_parts(self.end_date.as_deref(), end_time, self.duration)?,
            is_active: self.is_active,
        })
    }
}

/// An offer with the products it is attached to
#[derive(Debug, Serialize)]
pub struct OfferWithProducts {
    #[serde(flatten)]
    offer: offer_entity::Model,
    products: Vec<product::Model>,
}

/// `GET /api/offers` - newest first
pub async fn list_offers(State(state): State<AppState>) -> ApiResult<Json<Vec<OfferWithProducts>>> {
    let offers = offer::list_offers(&state.db).await?;
    Ok(Json(
        offers
            .into_iter()
            .map(|(offer, products)| OfferWithProducts { offer, products })
            .collect(),
    ))
}

/// `POST /api/offers`
pub async fn create_offer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<OfferRequest>,
) -> ApiResult<(StatusCode, Json<offer_entity::Model>)> {
    require_admin(&state, &headers).await?;
    let created = offer::create_offer(&state.db, request.input()?, state.clock.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/offers/:id` - an omitted `isActive` leaves the switch as it was
pub async fn update_offer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<OfferRequest>,
) -> ApiResult<Json<offer_entity::Model>> {
    require_admin(&state, &headers).await?;
    let updated =
        offer::update_offer(&state.db, &id, request.input()?, state.clock.as_ref()).await?;
    Ok(Json(updated))
}

/// `DELETE /api/offers/:id`
pub async fn delete_offer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers).await?;
    let detached = offer::delete_offer(&state.db, &id).await?;
    Ok(Json(json!({ "success": true, "detachedProducts": detached })))
}
