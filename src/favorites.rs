//! Favorites store.
//!
//! Owned outside the engine; the catalog reads membership by `code` and
//! watches the revision counter to know when its derived view is stale.
//! The set can be exported as an opaque string (bitcode, base64-encoded)
//! for a key-value backing store and restored from it.
//!
//! ## Example
//!
//! ```ignore
//! let favorites = FavoritesStore::new();
//! favorites.toggle(&product);
//! assert!(favorites.is_favorite(&product.code));
//!
//! let saved = favorites.export_snapshot()?;
//! let restored = FavoritesStore::new();
//! restored.import_snapshot(&saved)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::product::ProductRecord;

/// Storage key under which the snapshot is conventionally kept.
pub const STORAGE_KEY: &str = "favorites-storage";

/// A favorited product as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub code: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub description: Option<String>,
}

impl From<&ProductRecord> for FavoriteRecord {
    fn from(product: &ProductRecord) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            price: product.price.clone(),
            image_url: product.image_url.clone(),
            description: product.description.clone(),
        }
    }
}

/// Error restoring a favorites snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The string was not valid base64.
    Encoding(String),
    /// The bytes did not decode to a favorites list.
    Decode(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Encoding(e) => write!(f, "favorites snapshot is not base64: {}", e),
            SnapshotError::Decode(e) => write!(f, "failed to decode favorites snapshot: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Insertion-ordered favorites set with change notification.
///
/// Clone-friendly via Arc; every clone observes the same set.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    records: Arc<RwLock<Vec<FavoriteRecord>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            revision: Arc::new(revision),
        }
    }

    /// Add the product if absent, remove it if present. Returns whether it
    /// is a favorite afterwards.
    pub fn toggle(&self, product: &ProductRecord) -> bool {
        let now_favorite = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            match records.iter().position(|f| f.code == product.code) {
                Some(index) => {
                    records.remove(index);
                    false
                }
                None => {
                    records.push(FavoriteRecord::from(product));
                    true
                }
            }
        };
        self.bump();
        now_favorite
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|f| f.code == code)
    }

    /// Membership set used by the favorites filter.
    pub fn codes(&self) -> HashSet<String> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.code.clone())
            .collect()
    }

    /// All favorites in insertion order.
    pub fn favorites(&self) -> Vec<FavoriteRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.bump();
    }

    /// Monotonic change counter.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Serialize the set for persistence.
    pub fn export_snapshot(&self) -> Result<String, bitcode::Error> {
        let bytes = bitcode::serialize(&self.favorites())?;
        Ok(STANDARD.encode(bytes))
    }

    /// Replace the set with a previously exported snapshot.
    pub fn import_snapshot(&self, snapshot: &str) -> Result<usize, SnapshotError> {
        let bytes = STANDARD
            .decode(snapshot.trim())
            .map_err(|e| SnapshotError::Encoding(e.to_string()))?;
        let restored: Vec<FavoriteRecord> =
            bitcode::deserialize(&bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        let count = restored.len();
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = restored;
        self.bump();
        Ok(count)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
