//! Catalog business logic - product management, listing and seeding.
//!
//! Products are listed in admin-defined order and priced lazily: the effective
//! price of each entry is computed against the clock when the catalog is read,
//! never cached on the row.

use crate::{
    config::store::AppConfig,
    core::{
        clock::Clock,
        offer::{self, OfferInput, OfferWindow},
        pricing::{ProductPricing, WeightUnit, price_product},
    },
    entities::{Offer, Product, offer as offer_entity, product},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Narrows a catalog listing
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or brand
    pub search: Option<String>,
    /// Only products that can be ordered
    pub available_only: bool,
}

/// Fields an admin supplies when creating or editing a product
#[derive(Debug, Clone)]
pub struct ProductInput {
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
    pub is_available: bool,
    /// Offer to attach
    pub offer_id: Option<String>,
}

impl ProductInput {
    /// A minimal available product with only a name and price
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            price_per_100gm: None,
            weight: None,
            weight_unit: None,
            image: None,
            company: None,
            is_available: true,
            offer_id: None,
        }
    }
}

/// A product as shown to customers, with its prices resolved now
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// The stored product
    #[serde(flatten)]
    pub product: product::Model,
    /// The attached offer, whether or not it is running
    pub offer: Option<offer_entity::Model>,
    /// Prices at the time of the listing
    pub pricing: ProductPricing,
}

/// Input after validation and normalisation
struct ValidProduct {
    name: String,
    weight_unit: Option<String>,
    image: Option<String>,
    company: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn validate(input: &ProductInput) -> Result<ValidProduct> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.price,
        });
    }

    if let Some(per_100gm) = input.price_per_100gm {
        if !per_100gm.is_finite() || per_100gm < 0.0 {
            return Err(Error::InvalidAmount { amount: per_100gm });
        }
    }

    if let Some(weight) = input.weight {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::InvalidWeight { weight });
        }
    }

    let weight_unit = match non_blank(input.weight_unit.as_ref()) {
        Some(unit) => Some(unit.parse::<WeightUnit>()?.to_string()),
        None => None,
    };

    Ok(ValidProduct {
        name: name.to_string(),
        weight_unit,
        image: non_blank(input.image.as_ref()),
        company: non_blank(input.company.as_ref()),
    })
}

async fn ensure_offer_exists(db: &DatabaseConnection, offer_id: Option<&str>) -> Result<()> {
    if let Some(offer_id) = offer_id {
        if Offer::find_by_id(offer_id.to_string()).one(db).await?.is_none() {
            return Err(Error::OfferNotFound {
                id: offer_id.to_string(),
            });
        }
    }
    Ok(())
}

/// Retrieves products with their offers, in display order (`order` ascending,
/// newest first among equal positions).
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
) -> Result<Vec<(product::Model, Option<offer_entity::Model>)>> {
    let mut query = Product::find();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((Product, product::Column::Name))))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((Product, product::Column::Company))))
                        .like(pattern),
                ),
        );
    }

    if filter.available_only {
        query = query.filter(product::Column::IsAvailable.eq(true));
    }

    query
        .order_by_asc(product::Column::Order)
        .order_by_desc(product::Column::CreatedAt)
        .find_also_related(Offer)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Prices each listed product at the clock's current time.
#[must_use]
pub fn price_catalog(
    rows: Vec<(product::Model, Option<offer_entity::Model>)>,
    clock: &dyn Clock,
) -> Vec<CatalogEntry> {
    rows.into_iter()
        .map(|(product, offer)| {
            let pricing = price_product(&product, offer.as_ref(), clock);
            CatalogEntry {
                product,
                offer,
                pricing,
            }
        })
        .collect()
}

/// Retrieves a specific product by its id.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: &str,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a product at the end of the display order.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price or per-100g price is negative or not finite
/// - The weight is not positive, or the unit is not `kg`/`gm`
/// - The referenced offer does not exist
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    input: ProductInput,
    clock: &dyn Clock,
) -> Result<product::Model> {
    let valid = validate(&input)?;
    ensure_offer_exists(db, input.offer_id.as_deref()).await?;

    let next_order = Product::find()
        .order_by_desc(product::Column::Order)
        .one(db)
        .await?
        .map_or(1, |last| last.order + 1);

    let now = clock.now();
    let product = product::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(valid.name),
        price: Set(input.price),
        price_per_100gm: Set(input.price_per_100gm),
        weight: Set(input.weight),
        weight_unit: Set(valid.weight_unit),
        image: Set(valid.image),
        company: Set(valid.company),
        is_available: Set(input.is_available),
        order: Set(next_order),
        offer_id: Set(input.offer_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(product_id = %product.id, name = %product.name, order = product.order, "product created");
    Ok(product)
}

/// Replaces a product's editable fields. Its display position is kept.
///
/// # Errors
/// Same validation as [`create_product`], plus [`Error::ProductNotFound`].
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: &str,
    input: ProductInput,
    clock: &dyn Clock,
) -> Result<product::Model> {
    let valid = validate(&input)?;
    ensure_offer_exists(db, input.offer_id.as_deref()).await?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })?
        .into();

    product.name = Set(valid.name);
    product.price = Set(input.price);
    product.price_per_100gm = Set(input.price_per_100gm);
    product.weight = Set(input.weight);
    product.weight_unit = Set(valid.weight_unit);
    product.image = Set(valid.image);
    product.company = Set(valid.company);
    product.is_available = Set(input.is_available);
    product.offer_id = Set(input.offer_id);
    product.updated_at = Set(clock.now());

    let product = product.update(db).await?;
    tracing::info!(product_id = %product.id, "product updated");
    Ok(product)
}

/// Permanently removes a product.
pub async fn delete_product(db: &DatabaseConnection, product_id: &str) -> Result<()> {
    let result = Product::delete_by_id(product_id.to_string()).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound {
            id: product_id.to_string(),
        });
    }
    tracing::info!(product_id, "product deleted");
    Ok(())
}

/// Inserts the configured offers and products when the catalog is empty.
/// Returns the number of products inserted.
pub async fn seed_catalog(
    db: &DatabaseConnection,
    config: &AppConfig,
    clock: &dyn Clock,
) -> Result<usize> {
    if Product::find().count(db).await? > 0 {
        tracing::debug!("catalog already populated, skipping seed");
        return Ok(0);
    }

    let mut offer_ids: HashMap<&str, String> = HashMap::new();
    for seed in &config.offers {
        let existing = offer::get_offer_by_name(db, &seed.name).await?;
        let offer = match existing {
            Some(offer) => offer,
            None => {
                let window = OfferWindow::from_parts(
                    seed.end_date.as_deref(),
                    seed.end_time.as_deref(),
                    seed.duration,
                )?;
                offer::create_offer(
                    db,
                    OfferInput {
                        name: seed.name.clone(),
                        discount_percentage: seed.discount_percentage,
                        window,
                        is_active: Some(seed.is_active),
                    },
                    clock,
                )
                .await?
            }
        };
        offer_ids.insert(seed.name.as_str(), offer.id);
    }

    for seed in &config.products {
        let offer_id = match seed.offer.as_deref() {
            Some(name) => Some(offer_ids.get(name).cloned().ok_or_else(|| {
                Error::OfferNotFound {
                    id: name.to_string(),
                }
            })?),
            None => None,
        };
        create_product(
            db,
            ProductInput {
                name: seed.name.clone(),
                price: seed.price,
                price_per_100gm: seed.price_per_100gm,
                weight: seed.weight,
                weight_unit: seed.weight_unit.clone(),
                image: seed.image.clone(),
                company: seed.company.clone(),
                is_available: seed.is_available,
                offer_id,
            },
            clock,
        )
        .await?;
    }

    tracing::info!(
        offers = config.offers.len(),
        products = config.products.len(),
        "catalog seeded"
    );
    Ok(config.products.len())
}
