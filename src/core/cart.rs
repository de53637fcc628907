//! Cart ledger - the customer's selected products and their totals.
//!
//! The ledger is an owned value holding line items in insertion order and the
//! chosen payment method. Every mutation is written through to a [`CartStore`]
//! so the cart survives restarts on the same device. Totals are never stored;
//! each getter recomputes from the current items.
//!
//! Line item prices are captured when an item is first added and are not
//! re-resolved later, so an offer expiring mid-session does not change the
//! price of items already in the cart.

use crate::{
    core::{cart_store::CartStore, clock::Clock, pricing::price_product},
    entities::{offer, product},
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee and threshold rules applied to cart totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct PricingRules {
    /// Subtotal below which orders cannot be submitted
    pub minimum_order: f64,
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: f64,
    /// Delivery fee charged between the minimum and the free-delivery threshold
    pub delivery_fee: f64,
    /// Surcharge for cash on delivery
    pub cod_fee: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            minimum_order: 50.0,
            free_delivery_threshold: 200.0,
            delivery_fee: 20.0,
            cod_fee: 20.0,
        }
    }
}

impl PricingRules {
    /// Rejects negative or non-finite amounts.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("minimum_order", self.minimum_order),
            ("free_delivery_threshold", self.free_delivery_threshold),
            ("delivery_fee", self.delivery_fee),
            ("cod_fee", self.cod_fee),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config {
                    message: format!("pricing.{field} must be a non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// How the customer intends to pay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Pay online (unspecified app)
    #[default]
    Online,
    /// Cash on delivery
    Cod,
    /// Google Pay
    Gpay,
    /// `PhonePe`
    Phonepe,
    /// Paytm
    Paytm,
}

impl PaymentMethod {
    /// Label used in order messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "Online Payment",
            Self::Cod => "Cash on Delivery (COD)",
            Self::Gpay => "Google Pay",
            Self::Phonepe => "PhonePe",
            Self::Paytm => "Paytm",
        }
    }

    /// Whether this is cash on delivery
    #[must_use]
    pub const fn is_cod(self) -> bool {
        matches!(self, Self::Cod)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One product in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id
    pub id: String,
    /// Product name at the time it was added
    pub name: String,
    /// Unit price captured when added, already discounted
    pub price: f64,
    /// Always at least 1
    pub quantity: u32,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl CartItem {
    /// `price × quantity`
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A product reference handed to [`CartLedger::add_item`]
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    /// Product id
    pub id: String,
    /// Product name
    pub name: String,
    /// Unit price to capture
    pub price: f64,
    /// Image URL
    pub image: Option<String>,
    /// Brand
    pub company: Option<String>,
}

impl NewCartItem {
    /// Snapshots a catalog product at its current effective price.
    ///
    /// # Errors
    /// Returns [`Error::ProductUnavailable`] if the product is switched off.
    pub fn from_product(
        product: &product::Model,
        offer: Option<&offer::Model>,
        clock: &dyn Clock,
    ) -> Result<Self> {
        if !product.is_available {
            return Err(Error::ProductUnavailable {
                name: product.name.clone(),
            });
        }
        let pricing = price_product(product, offer, clock);
        Ok(Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: pricing.unit_price,
            image: product.image.clone(),
            company: product.company.clone(),
        })
    }
}

/// The durable part of a cart: what gets written to storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Line items in insertion order
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Selected payment method
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// All derived figures of a cart at one moment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of quantities
    pub total_items: u32,
    /// Sum of line totals, before fees
    pub subtotal: f64,
    /// Delivery fee for this subtotal
    pub delivery_fee: f64,
    /// COD surcharge
    pub cod_fee: f64,
    /// Subtotal plus fees
    pub final_total: f64,
    /// How much more is needed for free delivery
    pub amount_for_free_delivery: f64,
    /// Whether the order can be submitted
    pub minimum_order_met: bool,
}

/// The customer's cart, written through to a [`CartStore`] on every change
#[derive(Debug)]
pub struct CartLedger<S: CartStore> {
    state: CartSnapshot,
    rules: PricingRules,
    store: S,
}

impl<S: CartStore> CartLedger<S> {
    /// Opens the cart persisted in `store`, or an empty one.
    pub fn open(store: S, rules: PricingRules) -> Result<Self> {
        let state = store.load()?.unwrap_or_default();
        tracing::debug!(items = state.items.len(), "cart loaded");
        Ok(Self {
            state,
            rules,
            store,
        })
    }

    /// Saves `next` and only then adopts it, so a failed save leaves the
    /// cart exactly as it was.
    fn commit(&mut self, next: CartSnapshot) -> Result<()> {
        self.store.save(&next).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist cart");
        })?;
        self.state = next;
        Ok(())
    }

    /// Line items in the order they were first added
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    /// Currently selected payment method
    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.state.payment_method
    }

    /// Rules used for fees and thresholds
    #[must_use]
    pub const fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Whether the cart has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Adds one unit of a product. An existing line is incremented and keeps
    /// the price it was first added at.
    pub fn add_item(&mut self, item: NewCartItem) -> Result<()> {
        let mut next = self.state.clone();
        if let Some(existing) = next.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            next.items.push(CartItem {
                id: item.id,
                name: item.name,
                price: item.price,
                quantity: 1,
                image: item.image,
                company: item.company,
            });
        }
        self.commit(next)
    }

    /// Removes a line. Removing an absent id does nothing.
    pub fn remove_item(&mut self, id: &str) -> Result<()> {
        let mut next = self.state.clone();
        next.items.retain(|i| i.id != id);
        self.commit(next)
    }

    /// Sets the quantity of a line. Zero or less removes it; anything above
    /// `u32::MAX` is clamped.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return self.remove_item(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut next = self.state.clone();
        if let Some(existing) = next.items.iter_mut().find(|i| i.id == id) {
            existing.quantity = quantity;
        }
        self.commit(next)
    }

    /// Empties the cart. The payment method is kept.
    pub fn clear_cart(&mut self) -> Result<()> {
        self.commit(CartSnapshot {
            items: Vec::new(),
            payment_method: self.state.payment_method,
        })
    }

    /// Selects how the customer will pay
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<()> {
        self.commit(CartSnapshot {
            items: self.state.items.clone(),
            payment_method: method,
        })
    }

    /// Sum of quantities
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.state
            .items
            .iter()
            .fold(0, |total, i| total.saturating_add(i.quantity))
    }

    /// Subtotal before fees
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.state.items.iter().map(CartItem::line_total).sum()
    }

    /// Delivery fee for the current subtotal.
    ///
    /// Free at or above the free-delivery threshold. Below the minimum order no
    /// fee is shown because the order cannot be submitted anyway.
    #[must_use]
    pub fn delivery_fee(&self) -> f64 {
        let subtotal = self.total_price();
        if subtotal >= self.rules.free_delivery_threshold || subtotal < self.rules.minimum_order
        {
            0.0
        } else {
            self.rules.delivery_fee
        }
    }

    /// COD surcharge for the selected payment method
    #[must_use]
    pub fn cod_fee(&self) -> f64 {
        if self.state.payment_method.is_cod() {
            self.rules.cod_fee
        } else {
            0.0
        }
    }

    /// Subtotal plus delivery and COD fees
    #[must_use]
    pub fn final_total(&self) -> f64 {
        self.total_price() + self.delivery_fee() + self.cod_fee()
    }

    /// How much more the customer must add for free delivery
    #[must_use]
    pub fn amount_for_free_delivery(&self) -> f64 {
        (self.rules.free_delivery_threshold - self.total_price()).max(0.0)
    }

    /// Whether the subtotal reaches the minimum order value
    #[must_use]
    pub fn is_minimum_order_met(&self) -> bool {
        self.total_price() >= self.rules.minimum_order
    }

    /// Every derived figure at once
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            total_items: self.total_items(),
            subtotal: self.total_price(),
            delivery_fee: self.delivery_fee(),
            cod_fee: self.cod_fee(),
            final_total: self.final_total(),
            amount_for_free_delivery: self.amount_for_free_delivery(),
            minimum_order_met: self.is_minimum_order_met(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::cart_store::MemoryCartStore;
    use crate::test_utils::{sample_offer, sample_product, test_clock};
    use chrono::Duration;

    fn item(id: &str, price: f64) -> NewCartItem {
        NewCartItem {
            id: id.to_string(),
            name: format!("Product {id}"),
            price,
            image: None,
            company: None,
        }
    }

    fn empty_cart() -> CartLedger<MemoryCartStore> {
        CartLedger::open(MemoryCartStore::default(), PricingRules::default()).unwrap()
    }

    fn cart_with_subtotal(subtotal: f64) -> CartLedger<MemoryCartStore> {
        let mut cart = empty_cart();
        cart.add_item(item("x", subtotal)).unwrap();
        cart
    }

    #[test]
    fn test_add_same_item_twice_increments_quantity() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 100.0)).unwrap();
        cart.add_item(item("a", 100.0)).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let mut cart = empty_cart();
        cart.add_item(item("b", 1.0)).unwrap();
        cart.add_item(item("a", 1.0)).unwrap();
        cart.add_item(item("b", 1.0)).unwrap();

        let ids: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_update_quantity_sets_absolute_value() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 10.0)).unwrap();
        cart.update_quantity("a", 5).unwrap();
        assert_eq!(cart.items()[0].quantity, 5);
        cart.update_quantity("a", 2).unwrap();
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 10.0)).unwrap();
        cart.add_item(item("b", 10.0)).unwrap();

        cart.update_quantity("a", 0).unwrap();
        assert!(cart.items().iter().all(|i| i.id != "a"));

        cart.update_quantity("b", -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_of_absent_item_is_noop() {
        let mut cart = empty_cart();
        cart.update_quantity("ghost", 4).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_item_is_noop() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 10.0)).unwrap();
        cart.remove_item("ghost").unwrap();
        cart.remove_item("ghost").unwrap();
        assert_eq!(cart.items().len(), 1);

        cart.remove_item("a").unwrap();
        cart.remove_item("a").unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_cart_keeps_payment_method() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 10.0)).unwrap();
        cart.set_payment_method(PaymentMethod::Cod).unwrap();
        cart.clear_cart().unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.payment_method(), PaymentMethod::Cod);
    }

    #[test]
    fn test_delivery_fee_tiers() {
        let cart = cart_with_subtotal(49.0);
        assert_eq!(cart.delivery_fee(), 0.0);
        assert!(!cart.is_minimum_order_met());

        let cart = cart_with_subtotal(50.0);
        assert_eq!(cart.delivery_fee(), 20.0);
        assert!(cart.is_minimum_order_met());

        let cart = cart_with_subtotal(199.99);
        assert_eq!(cart.delivery_fee(), 20.0);

        let cart = cart_with_subtotal(200.0);
        assert_eq!(cart.delivery_fee(), 0.0);
        assert_eq!(cart.amount_for_free_delivery(), 0.0);
    }

    #[test]
    fn test_amount_for_free_delivery() {
        assert_eq!(cart_with_subtotal(150.0).amount_for_free_delivery(), 50.0);
        assert_eq!(cart_with_subtotal(350.0).amount_for_free_delivery(), 0.0);
        assert_eq!(empty_cart().amount_for_free_delivery(), 200.0);
    }

    #[test]
    fn test_cod_fee_depends_only_on_payment_method() {
        for subtotal in [10.0, 60.0, 500.0] {
            let mut cart = cart_with_subtotal(subtotal);
            cart.set_payment_method(PaymentMethod::Cod).unwrap();
            assert_eq!(cart.cod_fee(), 20.0);

            for method in [
                PaymentMethod::Online,
                PaymentMethod::Gpay,
                PaymentMethod::Phonepe,
                PaymentMethod::Paytm,
            ] {
                cart.set_payment_method(method).unwrap();
                assert_eq!(cart.cod_fee(), 0.0);
            }
        }
    }

    #[test]
    fn test_online_order_above_free_delivery() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 100.0)).unwrap();
        cart.update_quantity("a", 2).unwrap();
        cart.add_item(item("b", 50.0)).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, 250.0);
        assert_eq!(totals.delivery_fee, 0.0);
        assert_eq!(totals.cod_fee, 0.0);
        assert_eq!(totals.final_total, 250.0);
        assert_eq!(totals.total_items, 3);
        assert!(totals.minimum_order_met);
    }

    #[test]
    fn test_cod_order_in_delivery_band() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 30.0)).unwrap();
        cart.add_item(item("a", 30.0)).unwrap();
        cart.set_payment_method(PaymentMethod::Cod).unwrap();

        assert_eq!(cart.total_price(), 60.0);
        assert_eq!(cart.delivery_fee(), 20.0);
        assert_eq!(cart.cod_fee(), 20.0);
        assert_eq!(cart.final_total(), 100.0);
    }

    #[test]
    fn test_totals_recomputed_after_every_mutation() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 120.0)).unwrap();
        assert_eq!(cart.final_total(), 140.0);

        cart.add_item(item("a", 120.0)).unwrap();
        assert_eq!(cart.final_total(), 240.0);

        cart.update_quantity("a", 0).unwrap();
        assert_eq!(cart.final_total(), 0.0);
    }

    #[test]
    fn test_price_snapshot_survives_offer_expiry() {
        let clock = test_clock();
        let offer = sample_offer(20, clock.0 + Duration::minutes(5));
        let product = sample_product("Rice", 100.0);

        let mut cart = empty_cart();
        cart.add_item(NewCartItem::from_product(&product, Some(&offer), &clock).unwrap())
            .unwrap();
        assert_eq!(cart.items()[0].price, 80.0);

        // Ten minutes later the offer is over; the captured price stays.
        let later = crate::core::clock::FixedClock(clock.0 + Duration::minutes(10));
        cart.add_item(NewCartItem::from_product(&product, Some(&offer), &later).unwrap())
            .unwrap();
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].price, 80.0);
        assert_eq!(cart.total_price(), 160.0);
    }

    #[test]
    fn test_unavailable_product_cannot_be_added() {
        let clock = test_clock();
        let mut product = sample_product("Rice", 100.0);
        product.is_available = false;

        let result = NewCartItem::from_product(&product, None, &clock);
        assert!(matches!(result, Err(Error::ProductUnavailable { .. })));
    }

    #[test]
    fn test_cart_reopens_from_store() {
        let store = MemoryCartStore::default();
        {
            let mut cart = CartLedger::open(store.clone(), PricingRules::default()).unwrap();
            cart.add_item(item("a", 45.0)).unwrap();
            cart.add_item(item("a", 45.0)).unwrap();
            cart.set_payment_method(PaymentMethod::Gpay).unwrap();
        }

        let reopened = CartLedger::open(store, PricingRules::default()).unwrap();
        assert_eq!(reopened.items().len(), 1);
        assert_eq!(reopened.items()[0].quantity, 2);
        assert_eq!(reopened.payment_method(), PaymentMethod::Gpay);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = CartSnapshot {
            items: vec![CartItem {
                id: "p1".to_string(),
                name: "Rice".to_string(),
                price: 383.0,
                quantity: 2,
                image: None,
                company: Some("Royal Foods".to_string()),
            }],
            payment_method: PaymentMethod::Cod,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["items"][0]["company"], "Royal Foods");
        assert!(json["items"][0].get("image").is_none());
    }

    struct BrokenStore;

    impl CartStore for BrokenStore {
        fn load(&self) -> Result<Option<CartSnapshot>> {
            Ok(Some(CartSnapshot {
                items: vec![CartItem {
                    id: "a".to_string(),
                    name: "Salt".to_string(),
                    price: 20.0,
                    quantity: 2,
                    image: None,
                    company: None,
                }],
                payment_method: PaymentMethod::Online,
            }))
        }

        fn save(&self, _snapshot: &CartSnapshot) -> Result<()> {
            Err(Error::Storage {
                message: "disk full".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_save_leaves_cart_unchanged() {
        let mut cart = CartLedger::open(BrokenStore, PricingRules::default()).unwrap();
        let before = (cart.items().to_vec(), cart.payment_method());

        assert!(matches!(cart.add_item(item("b", 10.0)), Err(Error::Storage { .. })));
        assert!(cart.add_item(item("a", 20.0)).is_err());
        assert!(cart.update_quantity("a", 7).is_err());
        assert!(cart.update_quantity("a", 0).is_err());
        assert!(cart.remove_item("a").is_err());
        assert!(cart.clear_cart().is_err());
        assert!(cart.set_payment_method(PaymentMethod::Cod).is_err());

        assert_eq!((cart.items().to_vec(), cart.payment_method()), before);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn test_huge_quantity_is_clamped() {
        let mut cart = empty_cart();
        cart.add_item(item("a", 1.0)).unwrap();
        cart.update_quantity("a", i64::MAX).unwrap();
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_custom_rules() {
        let rules = PricingRules {
            minimum_order: 100.0,
            free_delivery_threshold: 500.0,
            delivery_fee: 40.0,
            cod_fee: 15.0,
        };
        let mut cart = CartLedger::open(MemoryCartStore::default(), rules).unwrap();
        cart.add_item(item("a", 99.0)).unwrap();
        assert!(!cart.is_minimum_order_met());
        assert_eq!(cart.delivery_fee(), 0.0);

        cart.update_quantity("a", 2).unwrap();
        cart.set_payment_method(PaymentMethod::Cod).unwrap();
        assert_eq!(cart.final_total(), 198.0 + 40.0 + 15.0);
    }
}
