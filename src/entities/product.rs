//! Product entity - An item in the storefront catalog.
//!
//! Products carry an undiscounted price, an optional weight used for
//! per-100g pricing, and an optional reference to an offer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Opaque identifier (uuid v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Product name (e.g., "Premium Basmati Rice")
    pub name: String,
    /// Undiscounted unit price in rupees
    pub price: f64,
    /// Admin-entered price per 100g; derived from weight when absent
    #[serde(rename = "pricePer100gm")]
    pub price_per_100gm: Option<f64>,
    /// Pack weight, in `weight_unit`
    pub weight: Option<f64>,
    /// `kg` or `gm`
    pub weight_unit: Option<String>,
    /// Image URL
    pub image: Option<String>,
    /// Brand
    pub company: Option<String>,
    /// Whether the product can be added to a cart
    pub is_available: bool,
    /// Display position; the catalog is sorted ascending on this
    #[sea_orm(column_name = "sort_order")]
    pub order: i32,
    /// Offer applied to this product, if any
    pub offer_id: Option<String>,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product optionally belongs to one offer
    #[sea_orm(
        belongs_to = "super::offer::Entity",
        from = "Column::OfferId",
        to = "super::offer::Column::Id"
    )]
    Offer,
}

impl Related<super::offer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
