//! Admin product reordering.
//!
//! The admin list is the catalog sorted by `order`. Moving a product swaps it
//! with one neighbour and renumbers the whole list contiguously from 0; the new
//! numbering is persisted as one atomic batch. If the batch fails, the local
//! list is replaced with a fresh read of the database so the admin never sees
//! an order the server does not have.
//!
//! There is no version check on the batch: two admins reordering at once will
//! overwrite each other's numbering.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

/// Which neighbour to swap with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Towards the start of the list
    Up,
    /// Towards the end of the list
    Down,
}

/// One entry of a reorder batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Product id
    pub id: String,
    /// New display position
    pub order: i32,
}

/// The `{id, order}` batch describing a list's current numbering
#[must_use]
pub fn order_updates(products: &[product::Model]) -> Vec<OrderUpdate> {
    products
        .iter()
        .map(|p| OrderUpdate {
            id: p.id.clone(),
            order: p.order,
        })
        .collect()
}

/// Swaps a product with its neighbour and renumbers every product to its index.
///
/// Returns the batch to persist, or `None` when nothing moved (unknown id, or
/// already first/last).
pub fn move_product(
    products: &mut [product::Model],
    product_id: &str,
    direction: MoveDirection,
) -> Option<Vec<OrderUpdate>> {
    let index = products.iter().position(|p| p.id == product_id)?;
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => index + 1,
    };
    if target >= products.len() {
        return None;
    }

    products.swap(index, target);
    for (position, product) in products.iter_mut().enumerate() {
        product.order = i32::try_from(position).unwrap_or(i32::MAX);
    }
    Some(order_updates(products))
}

/// Retrieves every product in display order.
pub async fn list_products_by_order(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Order)
        .order_by_desc(product::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a reorder batch in one transaction. Any unknown id aborts the
/// whole batch.
pub async fn reorder_products(db: &DatabaseConnection, updates: &[OrderUpdate]) -> Result<()> {
    let txn = db.begin().await?;

    for update in updates {
        let result = Product::update_many()
            .col_expr(product::Column::Order, Expr::value(update.order))
            .filter(product::Column::Id.eq(update.id.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            // Dropping the transaction rolls back the updates already applied.
            return Err(Error::ProductNotFound {
                id: update.id.clone(),
            });
        }
    }

    txn.commit().await?;
    tracing::info!(products = updates.len(), "product order updated");
    Ok(())
}

/// Moves a product in the admin's list and persists the new numbering.
///
/// Returns `Ok(false)` when the move was a no-op. When persisting fails, `products`
/// is reloaded from the database and the original error is returned.
pub async fn move_and_persist(
    db: &DatabaseConnection,
    products: &mut Vec<product::Model>,
    product_id: &str,
    direction: MoveDirection,
) -> Result<bool> {
    let Some(updates) = move_product(products, product_id, direction) else {
        return Ok(false);
    };

    match reorder_products(db, &updates).await {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::error!(error = %e, product_id, "reorder failed, reloading product list");
            *products = list_products_by_order(db).await?;
            Err(e)
        }
    }
}
