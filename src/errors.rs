//! Unified error type for the storefront.

use thiserror::Error;

/// Every failure the storefront core, persistence layer or API can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or input that could not be interpreted
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable explanation
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Durable cart storage could not be read or written
    #[error("Storage error: {message}")]
    Storage {
        /// Human readable explanation
        message: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A price was negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A discount percentage fell outside 1..=99 after rounding
    #[error("Invalid discount percentage: {percentage}")]
    InvalidDiscount {
        /// The rejected percentage, as supplied
        percentage: f64,
    },

    /// A product weight was zero, negative or not finite
    #[error("Invalid weight: {weight}")]
    InvalidWeight {
        /// The rejected weight
        weight: f64,
    },

    /// A weight unit other than `kg` or `gm`
    #[error("Unknown weight unit: {unit}")]
    InvalidWeightUnit {
        /// The rejected unit
        unit: String,
    },

    /// No product with this id
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: String,
    },

    /// No offer with this id (or name, when seeding)
    #[error("Offer not found: {id}")]
    OfferNotFound {
        /// Requested offer id
        id: String,
    },

    /// Product is flagged unavailable and cannot be added to a cart
    #[error("Product not available: {name}")]
    ProductUnavailable {
        /// Product name
        name: String,
    },

    /// Order submission attempted with no items
    #[error("Your cart is empty")]
    EmptyCart,

    /// Order submission attempted below the minimum order value
    #[error("Minimum order is ₹{minimum:.2}, cart subtotal is ₹{subtotal:.2}")]
    MinimumOrderNotMet {
        /// Current cart subtotal
        subtotal: f64,
        /// Configured minimum
        minimum: f64,
    },

    /// `ADMIN_EMAIL` / `ADMIN_PASSWORD` are not set
    #[error("Admin credentials not configured")]
    AdminNotConfigured,

    /// Login attempt with the wrong email or password
    #[error("Invalid admin credentials")]
    InvalidCredentials,

    /// Request without a valid admin session
    #[error("Unauthorized")]
    Unauthorized,

    /// Payment verification retried inside the cooldown window
    #[error("Payment verification cooling down, retry in {remaining_secs}s")]
    VerificationCoolingDown {
        /// Whole seconds left in the cooldown
        remaining_secs: u64,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
