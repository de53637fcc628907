//! HTTP surface - the axum router, shared state and error mapping.
//!
//! Read routes are public. Every route that changes the catalog or offers
//! requires an `Authorization: Bearer <token>` header carrying a token issued
//! by `POST /api/auth/login`.

/// Admin login and logout
pub mod auth;
/// Offer listing and management
pub mod offers;
/// Product listing, management and reordering
pub mod products;

use crate::{
    config::{admin::AdminCredentials, store::AppConfig},
    core::{auth::AdminSessions, cart::PricingRules, clock::Clock},
    errors::Error,
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Store identity and pricing rules
    pub config: Arc<AppConfig>,
    /// Configured admin account, if any
    pub admin: Option<Arc<AdminCredentials>>,
    /// Open admin sessions
    pub sessions: AdminSessions,
    /// Time source for offer evaluation
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Bundles the pieces a running server needs
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        admin: Option<AdminCredentials>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            admin: admin.map(Arc::new),
            sessions: AdminSessions::default(),
            clock,
        }
    }
}

/// Builds the full router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/store", get(store_info))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/products/reorder", post(products::reorder_products))
        .route(
            "/api/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route(
            "/api/offers",
            get(offers::list_offers).post(offers::create_offer),
        )
        .route(
            "/api/offers/:id",
            put(offers::update_offer).delete(offers::delete_offer),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A core error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::ProductNotFound { .. } | Error::OfferNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Config { .. }
            | Error::Serialization(_)
            | Error::InvalidAmount { .. }
            | Error::InvalidDiscount { .. }
            | Error::InvalidWeight { .. }
            | Error::InvalidWeightUnit { .. }
            | Error::ProductUnavailable { .. }
            | Error::EmptyCart
            | Error::MinimumOrderNotMet { .. } => StatusCode::BAD_REQUEST,
            Error::AdminNotConfigured | Error::InvalidCredentials | Error::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Error::VerificationCoolingDown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Database(_) | Error::Storage { .. } | Error::Io(_) | Error::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Handler result type
pub type ApiResult<T> = std::result::Result<T, ApiError>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects the request unless it carries a live admin session token.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    match bearer_token(headers) {
        Some(token) if state.sessions.is_valid(token).await => Ok(()),
        _ => Err(Error::Unauthorized.into()),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreInfo {
    business_name: String,
    whatsapp_number: String,
    pricing: PricingRules,
}

async fn store_info(State(state): State<AppState>) -> Json<StoreInfo> {
    Json(StoreInfo {
        business_name: state.config.store.business_name.clone(),
        whatsapp_number: state.config.store.whatsapp_number.clone(),
        pricing: state.config.pricing.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_health_and_store_info() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let app = router(test_app_state(db));

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, Method::GET, "/api/store", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessName"], "JANU ENTERPRISE");
        assert_eq!(body["pricing"]["minimumOrder"], 50.0);
        assert_eq!(body["pricing"]["freeDeliveryThreshold"], 200.0);
        Ok(())
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                Error::ProductNotFound { id: "x".to_string() },
                StatusCode::NOT_FOUND,
            ),
            (Error::InvalidDiscount { percentage: 0.0 }, StatusCode::BAD_REQUEST),
            (Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                Error::VerificationCoolingDown { remaining_secs: 5 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                Error::Storage {
                    message: "disk".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc-123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc-123"));
    }
}
