//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases,
//! a fixed clock, and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    api::AppState,
    config::{admin::AdminCredentials, store::AppConfig},
    core::{
        catalog::{self, ProductInput},
        clock::FixedClock,
        offer::{self, OfferDuration, OfferInput, OfferWindow},
    },
    entities,
    errors::Result,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceExt;

/// Admin email configured by [`test_app_state`]
pub const TEST_ADMIN_EMAIL: &str = "admin@janu.example";
/// Admin password configured by [`test_app_state`]
pub const TEST_ADMIN_PASSWORD: &str = "s3cret";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The instant every test treats as "now": 2025-03-10 12:00:00 local.
pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// A clock frozen at [`test_now`].
pub fn test_clock() -> FixedClock {
    FixedClock(test_now())
}

/// An unsaved product with no weight, no brand and no offer.
///
/// The id is derived from the name, e.g. `"Brown Rice"` becomes `"brown-rice"`.
pub fn sample_product(name: &str, price: f64) -> entities::product::Model {
    entities::product::Model {
        id: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        price,
        price_per_100gm: None,
        weight: None,
        weight_unit: None,
        image: None,
        company: None,
        is_available: true,
        order: 0,
        offer_id: None,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// An unsaved, switched-on offer ending at `ends_at`.
pub fn sample_offer(discount_percentage: i32, ends_at: NaiveDateTime) -> entities::offer::Model {
    entities::offer::Model {
        id: format!("offer-{discount_percentage}"),
        name: format!("{discount_percentage}% off"),
        discount_percentage,
        ends_at,
        end_time: ends_at.format("%H:%M").to_string(),
        is_active: true,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * available, no weight, no brand, no offer
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> Result<entities::product::Model> {
    catalog::create_product(db, ProductInput::new(name, price), &test_clock()).await
}

/// Creates a test product attached to an existing offer.
pub async fn create_product_with_offer(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    offer_id: &str,
) -> Result<entities::product::Model> {
    let mut input = ProductInput::new(name, price);
    input.offer_id = Some(offer_id.to_string());
    catalog::create_product(db, input, &test_clock()).await
}

/// Creates an active test offer lasting one week from [`test_now`].
pub async fn create_test_offer(
    db: &DatabaseConnection,
    name: &str,
    discount_percentage: f64,
) -> Result<entities::offer::Model> {
    offer::create_offer(
        db,
        OfferInput {
            name: name.to_string(),
            discount_percentage,
            window: OfferWindow::Lasting(OfferDuration::OneWeek),
            is_active: None,
        },
        &test_clock(),
    )
    .await
}

/// API state over `db` with default config, a configured admin and [`test_clock`].
pub fn test_app_state(db: DatabaseConnection) -> AppState {
    AppState::new(
        db,
        AppConfig::default(),
        Some(AdminCredentials {
            email: TEST_ADMIN_EMAIL.to_string(),
            password: TEST_ADMIN_PASSWORD.to_string(),
        }),
        Arc::new(test_clock()),
    )
}

/// Sends one request through the router and decodes the JSON reply.
///
/// Empty bodies decode to `null`; non-JSON bodies come back as a string.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

/// Logs in as the test admin and returns the bearer token.
pub async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": TEST_ADMIN_EMAIL,
            "password": TEST_ADMIN_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    body["token"].as_str().unwrap_or_default().to_string()
}
