//! Core business logic - framework-agnostic storefront operations.
//!
//! Pure pricing and cart logic lives alongside the async catalog and offer
//! operations that run against a `SeaORM` connection. Nothing in here knows
//! about HTTP.

/// Admin credential verification
pub mod auth;
/// Cart ledger: line items, payment method and derived totals
pub mod cart;
/// Durable storage for the cart blob
pub mod cart_store;
/// Product catalog CRUD, listing and seeding
pub mod catalog;
/// Injectable source of the current local time
pub mod clock;
/// Offer expiry resolution, discount math and offer CRUD
pub mod offer;
/// Order message formatting and WhatsApp deep-links
pub mod order_message;
/// Admin product reordering
pub mod ordering;
/// Simulated QR payment verification
pub mod payment;
/// Per-unit and per-100g pricing
pub mod pricing;
