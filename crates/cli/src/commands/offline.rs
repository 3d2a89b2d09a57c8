//! Offline cart commands.
//!
//! The offline cart lives under `COUNTRYFRESH_OFFLINE_DIR` and is shared with
//! anything else using the same directory.

use countryfresh_cart::{CartConfig, FileStore, OfflineCartEntry, OfflineCartStore, StoreError};
use countryfresh_core::ProductId;

/// Open the offline cart configured for this process.
#[must_use]
pub fn open(config: &CartConfig) -> OfflineCartStore<FileStore> {
    OfflineCartStore::new(FileStore::new(&config.offline_dir))
}

#[allow(clippy::print_stdout)]
fn print_entries(entries: &[OfflineCartEntry]) {
    if entries.is_empty() {
        println!("Offline cart is empty");
        return;
    }
    for entry in entries {
        println!("{}\t{}", entry.product_id, entry.quantity);
    }
}

/// Add units of a product.
///
/// # Errors
///
/// Returns error if the offline cart cannot be read or written.
pub fn add(
    store: &OfflineCartStore<FileStore>,
    product: &str,
    quantity: u32,
) -> Result<(), StoreError> {
    let entries = store.add(&ProductId::new(product), quantity)?;
    print_entries(&entries);
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns error if the offline cart cannot be read or written.
pub fn remove(store: &OfflineCartStore<FileStore>, product: &str) -> Result<(), StoreError> {
    let entries = store.remove(&ProductId::new(product))?;
    print_entries(&entries);
    Ok(())
}

/// Overwrite a product's quantity.
///
/// # Errors
///
/// Returns error if the offline cart cannot be read or written.
pub fn set(
    store: &OfflineCartStore<FileStore>,
    product: &str,
    quantity: u32,
) -> Result<(), StoreError> {
    let entries = store.set_quantity(&ProductId::new(product), quantity)?;
    print_entries(&entries);
    Ok(())
}

/// Empty the offline cart.
///
/// # Errors
///
/// Returns error if the offline cart cannot be written.
pub fn clear(store: &OfflineCartStore<FileStore>) -> Result<(), StoreError> {
    store.clear()?;
    tracing::info!("Offline cart cleared");
    Ok(())
}

/// Print the total item count.
///
/// # Errors
///
/// Returns error if the offline cart cannot be read.
pub fn count(store: &OfflineCartStore<FileStore>) -> Result<(), StoreError> {
    let total = store.total_item_count()?;
    #[allow(clippy::print_stdout)]
    {
        println!("{total}");
    }
    Ok(())
}

/// Print every entry.
///
/// # Errors
///
/// Returns error if the offline cart cannot be read.
pub fn list(store: &OfflineCartStore<FileStore>) -> Result<(), StoreError> {
    print_entries(&store.entries()?);
    Ok(())
}
