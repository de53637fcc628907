//! Offer entity - A time-bounded percentage discount.
//!
//! The admin-supplied end date/time is resolved to a single `ends_at` instant
//! when the offer is written; readers only ever compare against that instant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Offer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Opaque identifier (uuid v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "Diwali Special")
    pub name: String,
    /// Whole-number discount in 1..=99
    pub discount_percentage: i32,
    /// Local time at which the offer stops applying (exclusive)
    pub ends_at: DateTime,
    /// `HH:MM` label of `ends_at`, shown to admins
    pub end_time: String,
    /// Admin on/off switch, independent of the expiry
    pub is_active: bool,
    /// When the offer was created
    pub created_at: DateTime,
    /// When the offer was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Offer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One offer applies to many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
