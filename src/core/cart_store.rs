//! Durable storage for the cart.
//!
//! The cart is a single JSON blob (`{"items": [...], "paymentMethod": "..."}`)
//! stored under a fixed namespace on the customer's device. It is read once
//! when the cart opens and rewritten after every change.

use crate::{
    core::cart::{CartItem, CartSnapshot},
    errors::{Error, Result},
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Fixed namespace the cart blob is stored under
pub const CART_STORAGE_KEY: &str = "janu-cart-storage";

/// Somewhere a cart snapshot can be kept between sessions
pub trait CartStore {
    /// Reads the stored cart, `None` when nothing usable is stored.
    fn load(&self) -> Result<Option<CartSnapshot>>;

    /// Replaces the stored cart.
    fn save(&self, snapshot: &CartSnapshot) -> Result<()>;
}

/// Decodes a stored blob. A corrupt blob is logged and treated as no cart at
/// all, so a bad write never locks a customer out of ordering.
fn decode(blob: &str) -> Option<CartSnapshot> {
    serde_json::from_str(blob)
        .inspect_err(|e| tracing::warn!(error = %e, "discarding unreadable cart blob"))
        .ok()
        .map(normalize)
}

/// Drops zero-quantity lines and folds repeated ids into their first line.
fn normalize(snapshot: CartSnapshot) -> CartSnapshot {
    let mut items: Vec<CartItem> = Vec::with_capacity(snapshot.items.len());
    for item in snapshot.items.into_iter().filter(|i| i.quantity > 0) {
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => items.push(item),
        }
    }
    CartSnapshot {
        items,
        payment_method: snapshot.payment_method,
    }
}

/// Stores the cart as `<dir>/janu-cart-storage.json`
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    /// Keeps the cart file inside `dir`
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    /// Location of the cart file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Result<Option<CartSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = fs::read_to_string(&self.path)?;
        Ok(decode(&blob))
    }

    /// Writes to a sibling temp file and renames it over the old blob, so a
    /// crash mid-write leaves the previous cart intact.
    fn save(&self, snapshot: &CartSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store; clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStore {
    /// Raw stored JSON, if any
    pub fn raw(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    /// Replaces the raw stored JSON
    pub fn set_raw(&self, blob: Option<String>) -> Result<()> {
        *self.lock()? = blob;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.blob.lock().map_err(|_| Error::Storage {
            message: "cart store lock poisoned".to_string(),
        })
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Option<CartSnapshot>> {
        Ok(self.lock()?.as_deref().and_then(decode))
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<()> {
        let blob = serde_json::to_string(snapshot)?;
        *self.lock()? = Some(blob);
        Ok(())
    }
}
