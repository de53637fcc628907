//! Store configuration loading from config.toml
//!
//! `config.toml` names the business, the WhatsApp number orders are sent to,
//! the cart pricing rules, and an optional seed catalog that is inserted
//! into an empty database on first run.

use crate::{
    core::{cart::PricingRules, offer::OfferDuration},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_BUSINESS_NAME: &str = "JANU ENTERPRISE";
const DEFAULT_WHATSAPP_NUMBER: &str = "+919876543210";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Business identity
    #[serde(default)]
    pub store: StoreConfig,
    /// Cart fee and threshold rules
    #[serde(default)]
    pub pricing: PricingRules,
    /// Offers to seed into an empty catalog
    #[serde(default)]
    pub offers: Vec<OfferSeed>,
    /// Products to seed into an empty catalog
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Business identity used in order messages
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Name shown in the order message header and sign-off
    #[serde(default = "default_business_name")]
    pub business_name: String,
    /// Number orders are sent to; formatting characters are allowed
    #[serde(default = "default_whatsapp_number")]
    pub whatsapp_number: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            business_name: default_business_name(),
            whatsapp_number: default_whatsapp_number(),
        }
    }
}

fn default_business_name() -> String {
    DEFAULT_BUSINESS_NAME.to_string()
}

fn default_whatsapp_number() -> String {
    DEFAULT_WHATSAPP_NUMBER.to_string()
}

const fn default_true() -> bool {
    true
}

/// Seed entry for a single offer
#[derive(Debug, Clone, Deserialize)]
pub struct OfferSeed {
    /// Offer name; products reference offers by this name
    pub name: String,
    /// Discount percentage, rounded before storage
    pub discount_percentage: f64,
    /// Relative expiry (`tomorrow`, `2days`, `1week`)
    pub duration: Option<OfferDuration>,
    /// Absolute expiry date (`YYYY-MM-DD`) or datetime, used when `duration` is absent
    pub end_date: Option<String>,
    /// `HH:MM` applied to a bare `end_date`
    pub end_time: Option<String>,
    /// Admin on/off switch
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Seed entry for a single product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    /// Product name
    pub name: String,
    /// Undiscounted price
    pub price: f64,
    /// Explicit price per 100g
    pub price_per_100gm: Option<f64>,
    /// Pack weight
    pub weight: Option<f64>,
    /// `kg` or `gm`
    pub weight_unit: Option<String>,
    /// Image URL
    pub image: Option<String>,
    /// Brand
    pub company: Option<String>,
    /// Whether the product can be ordered
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Name of a seeded offer to attach
    pub offer: Option<String>,
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.pricing.validate()?;
    Ok(config)
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`) and applies
/// the `BUSINESS_NAME` / `WHATSAPP_NUMBER` environment overrides.
///
/// A missing config file is not an error: defaults are used.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        tracing::warn!(path = %path, "config file not found, using defaults");
        AppConfig::default()
    };

    if let Ok(name) = std::env::var("BUSINESS_NAME") {
        config.store.business_name = name;
    }
    if let Ok(number) = std::env::var("WHATSAPP_NUMBER") {
        config.store.whatsapp_number = number;
    }

    tracing::info!(
        business = %config.store.business_name,
        offers = config.offers.len(),
        products = config.products.len(),
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [store]
            business_name = "Test Foods"
            whatsapp_number = "+91 98765-43210"

            [pricing]
            minimum_order = 100.0
            free_delivery_threshold = 500.0
            delivery_fee = 30.0
            cod_fee = 25.0

            [[offers]]
            name = "Diwali Special"
            discount_percentage = 15
            duration = "1week"

            [[offers]]
            name = "Weekend Sale"
            discount_percentage = 10.4
            end_date = "2030-01-05"
            end_time = "18:00"

            [[products]]
            name = "Premium Basmati Rice"
            price = 450.0
            weight = 1.0
            weight_unit = "kg"
            company = "Royal Foods"
            offer = "Diwali Special"

            [[products]]
            name = "Brown Sugar"
            price = 180.0
            weight = 500.0
            weight_unit = "gm"
            is_available = false
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.store.business_name, "Test Foods");
        assert_eq!(config.pricing.minimum_order, 100.0);
        assert_eq!(config.pricing.cod_fee, 25.0);
        assert_eq!(config.offers.len(), 2);
        assert_eq!(config.offers[0].duration, Some(OfferDuration::OneWeek));
        assert!(config.offers[1].duration.is_none());
        assert!(config.offers[1].is_active);
        assert_eq!(config.products.len(), 2);
        assert!(config.products[0].is_available);
        assert!(!config.products[1].is_available);
        assert_eq!(config.products[0].offer.as_deref(), Some("Diwali Special"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.store.business_name, "JANU ENTERPRISE");
        assert_eq!(config.store.whatsapp_number, "+919876543210");
        assert_eq!(config.pricing, PricingRules::default());
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_rejects_negative_pricing_rules() {
        let result = parse_config("[pricing]\ndelivery_fee = -5.0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        let result = parse_config("[store\nbusiness_name = 1");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = parse_config(include_str!("../../config.toml")).unwrap();
        assert_eq!(config.offers.len(), 2);
        assert_eq!(config.products.len(), 8);
        let offers: Vec<&str> = config.offers.iter().map(|o| o.name.as_str()).collect();
        for product in &config.products {
            if let Some(offer) = product.offer.as_deref() {
                assert!(offers.contains(&offer), "{} references {offer}", product.name);
            }
        }
    }
}
