//! Pricing calculator - effective unit price and price per 100g.
//!
//! The effective price of a product is its list price reduced by the attached
//! offer's discount, but only while that offer applies. Per-100g pricing is
//! derived from the effective price and the pack weight.

use crate::{
    core::{
        clock::Clock,
        offer::{calculate_discounted_price, offer_applies},
    },
    entities::{offer, product},
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unit a product weight is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// Kilograms
    Kg,
    /// Grams
    Gm,
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(Self::Kg),
            "gm" => Ok(Self::Gm),
            _ => Err(Error::InvalidWeightUnit {
                unit: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kg => write!(f, "kg"),
            Self::Gm => write!(f, "gm"),
        }
    }
}

/// Converts a weight to grams.
#[must_use]
pub fn to_grams(weight: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => weight * 1000.0,
        WeightUnit::Gm => weight,
    }
}

/// Price of 100g, rounded to the nearest rupee.
#[must_use]
pub fn price_per_100gm(price: f64, grams: f64) -> f64 {
    (price / grams * 100.0).round()
}

/// Price of 100g for a pack of `weight` `unit`.
#[must_use]
pub fn price_per_100gm_from_weight(price: f64, weight: f64, unit: WeightUnit) -> f64 {
    price_per_100gm(price, to_grams(weight, unit))
}

/// Human readable pack size, e.g. `500 gm`.
#[must_use]
pub fn format_weight(weight: f64, unit: WeightUnit) -> String {
    format!("{weight} {unit}")
}

/// The pack weight used for per-100g pricing. Products without a usable
/// weight are priced as 1 kg packs.
#[must_use]
pub fn pack_weight(product: &product::Model) -> (f64, WeightUnit) {
    let unit = product
        .weight_unit
        .as_deref()
        .and_then(|u| u.parse::<WeightUnit>().ok());
    match (product.weight, unit) {
        (Some(weight), Some(unit)) if weight.is_finite() && weight > 0.0 => (weight, unit),
        _ => (1.0, WeightUnit::Kg),
    }
}

/// Prices of a product at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricing {
    /// Price before any discount
    pub original_price: f64,
    /// Price a customer pays now
    pub unit_price: f64,
    /// Discount applied to `unit_price`, when an offer is running
    pub discount_percentage: Option<i32>,
    /// Price per 100g, derived from `unit_price` when discounted
    #[serde(rename = "pricePer100gm")]
    pub price_per_100gm: f64,
}

impl ProductPricing {
    /// Whether a running offer reduced the price
    #[must_use]
    pub const fn has_active_offer(&self) -> bool {
        self.discount_percentage.is_some()
    }
}

/// Prices a product against its (optional) offer at the clock's current time.
///
/// A stored per-100g price is trusted as long as no offer is running; while one
/// is, the figure is always re-derived from the discounted price.
#[must_use]
pub fn price_product(
    product: &product::Model,
    offer: Option<&offer::Model>,
    clock: &dyn Clock,
) -> ProductPricing {
    let running = offer.filter(|o| offer_applies(o, clock));
    let unit_price = running.map_or(product.price, |o| {
        calculate_discounted_price(product.price, o.discount_percentage)
    });

    let stored = product.price_per_100gm.filter(|p| *p > 0.0);
    let price_per_100gm = match (stored, running) {
        (Some(stored), None) => stored,
        _ => {
            let (weight, unit) = pack_weight(product);
            price_per_100gm_from_weight(unit_price, weight, unit)
        }
    };

    ProductPricing {
        original_price: product.price,
        unit_price,
        discount_percentage: running.map(|o| o.discount_percentage),
        price_per_100gm,
    }
}
