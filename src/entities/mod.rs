//! Entity module - SeaORM entity definitions for the catalog tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod offer;
pub mod product;

// Re-export specific types to avoid conflicts
pub use offer::{Column as OfferColumn, Entity as Offer, Model as OfferModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
