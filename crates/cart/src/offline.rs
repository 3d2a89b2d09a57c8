//! Offline cart kept in persistent key-value storage.
//!
//! A fallback for when no server round-trip is wanted. The whole cart lives
//! under one namespaced key as a JSON array:
//!
//! ```json
//! [{"productId": "12", "quantity": 2}, {"productId": "15", "quantity": 1}]
//! ```
//!
//! Every mutation is written before it returns, so the next read sees it.
//! Nothing coordinates separate processes sharing the same storage; a
//! read-modify-write here can lose a concurrent write from another one.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use countryfresh_core::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Storage key holding the offline cart.
pub const STORAGE_KEY: &str = "countryfresh_cart";

/// Errors from the offline store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The cart could not be encoded.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The key cannot be used as a storage name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Persistent string storage.
pub trait KeyValueStore {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value before returning. File-backed stores flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Storage with one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` for storage. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves half a cart behind.
        let tmp = path.with_extension("json.tmp");
        let written = write_synced(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            match fs::remove_file(&tmp) {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(
                        path = %tmp.display(),
                        error = %cleanup,
                        "Failed to remove temporary cart file"
                    );
                }
                _ => {}
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_synced(path: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One product in the offline cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineCartEntry {
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
}

/// The offline cart: product -> quantity, unique by product.
#[derive(Debug)]
pub struct OfflineCartStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> OfflineCartStore<S> {
    /// Open the cart stored under the default key.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    /// Open a cart stored under a custom key.
    #[must_use]
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Current entries, in insertion order.
    ///
    /// Unreadable stored data is logged and treated as an empty cart.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    pub fn entries(&self) -> Result<Vec<OfflineCartEntry>, StoreError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<OfflineCartEntry>>(&raw) {
            Ok(entries) => Ok(entries.into_iter().filter(|e| e.quantity > 0).collect()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable offline cart");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[OfflineCartEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries)?;
        self.storage.set(&self.key, &json)
    }

    /// Add units of a product, merging with an existing entry.
    ///
    /// Returns the updated cart. Adding zero units changes nothing.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read or written.
    #[instrument(skip(self, product), fields(product = %product))]
    pub fn add(
        &self,
        product: &ProductId,
        quantity: u32,
    ) -> Result<Vec<OfflineCartEntry>, StoreError> {
        let mut entries = self.entries()?;
        if quantity == 0 {
            return Ok(entries);
        }

        match entries.iter_mut().find(|e| &e.product_id == product) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
            None => entries.push(OfflineCartEntry {
                product_id: product.clone(),
                quantity,
            }),
        }

        self.save(&entries)?;
        debug!(entries = entries.len(), "Offline cart updated");
        Ok(entries)
    }

    /// Remove a product. Removing a missing product is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read or written.
    #[instrument(skip(self, product), fields(product = %product))]
    pub fn remove(&self, product: &ProductId) -> Result<Vec<OfflineCartEntry>, StoreError> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|e| &e.product_id != product);
        if entries.len() != before {
            self.save(&entries)?;
        }
        Ok(entries)
    }

    /// Overwrite the quantity of an existing product.
    ///
    /// Missing products are not created. Setting zero removes the product.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read or written.
    #[instrument(skip(self, product), fields(product = %product))]
    pub fn set_quantity(
        &self,
        product: &ProductId,
        quantity: u32,
    ) -> Result<Vec<OfflineCartEntry>, StoreError> {
        if quantity == 0 {
            return self.remove(product);
        }

        let mut entries = self.entries()?;
        if let Some(entry) = entries.iter_mut().find(|e| &e.product_id == product) {
            entry.quantity = quantity;
            self.save(&entries)?;
        }
        Ok(entries)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove(&self.key)
    }

    /// Sum of all quantities, for the badge.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    pub fn total_item_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .entries()?
            .iter()
            .map(|e| u64::from(e.quantity))
            .sum())
    }
}
