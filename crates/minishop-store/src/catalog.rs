//! Catalog operations: listing products and decrementing stock.

use std::path::PathBuf;

use minishop_core::Product;
use thiserror::Error;

use crate::json_file::JsonFileStore;
use crate::keyed::{CasOutcome, KeyedStore};
use crate::StoreError;

/// Upper bound on optimistic retries for one stock decrement. Each lost
/// attempt means another purchase of the same product committed.
pub const MAX_SWAP_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid quantity")]
    InvalidQuantity(i64),

    #[error("Product not found")]
    NotFound(String),

    #[error("Not enough stock")]
    InsufficientStock {
        id: String,
        requested: i64,
        available: u32,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// The product catalog over any [`KeyedStore`] backend.
pub struct Catalog<S> {
    store: S,
}

impl Catalog<JsonFileStore<Product>> {
    /// Catalog persisted as a JSON array document at `path`.
    pub fn open_json(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(path))
    }
}

impl<S: KeyedStore<Product>> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every product in document order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] when the document cannot be read or parsed.
    pub fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list()?)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] when the document cannot be read or parsed.
    pub fn get_product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self.store.get(id)?)
    }

    /// Removes `quantity` units from product `id` and returns the updated product.
    ///
    /// The read, validation and write form an optimistic loop: the write only
    /// lands if the stored product is unchanged since it was read, otherwise
    /// the check is repeated against the fresh value. Concurrent purchases
    /// therefore cannot take stock below zero.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidQuantity`] when `quantity` is not positive.
    /// - [`CatalogError::NotFound`] when no product has this id.
    /// - [`CatalogError::InsufficientStock`] when `quantity` exceeds stock.
    /// - [`CatalogError::Storage`] on read/write failure, or
    ///   [`StoreError::Contention`] after [`MAX_SWAP_ATTEMPTS`] lost races.
    pub fn decrement_stock(&self, id: &str, quantity: i64) -> Result<Product, CatalogError> {
        if quantity <= 0 {
            return Err(CatalogError::InvalidQuantity(quantity));
        }

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let current = self
                .store
                .get(id)?
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

            let remaining = u32::try_from(quantity)
                .ok()
                .and_then(|q| current.quantity.checked_sub(q))
                .ok_or_else(|| CatalogError::InsufficientStock {
                    id: id.to_string(),
                    requested: quantity,
                    available: current.quantity,
                })?;

            let mut updated = current.clone();
            updated.quantity = remaining;

            match self.store.compare_and_swap(id, &current, updated.clone())? {
                CasOutcome::Swapped => {
                    tracing::info!(product_id = id, quantity, remaining, "stock decremented");
                    return Ok(updated);
                }
                CasOutcome::Mismatch { .. } => {
                    tracing::debug!(product_id = id, attempt, "stock changed concurrently; retrying");
                }
            }
        }

        tracing::warn!(product_id = id, "stock decrement abandoned after repeated conflicts");
        Err(StoreError::Contention {
            key: id.to_string(),
            attempts: MAX_SWAP_ATTEMPTS,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::memory::MemoryStore;

    fn catalog() -> Catalog<MemoryStore<Product>> {
        Catalog::new(MemoryStore::new(vec![
            Product::new("a", "Alpha", Decimal::new(10, 0), 5),
            Product::new("b", "Beta", Decimal::new(4, 0), 0),
        ]))
    }

    #[test]
    fn decrement_returns_product_with_reduced_quantity() {
        let catalog = catalog();
        let updated = catalog.decrement_stock("a", 3).expect("decrement");
        assert_eq!(updated.id, "a");
        assert_eq!(updated.quantity, 2);
        assert_eq!(
            catalog.get_product("a").expect("read").map(|p| p.quantity),
            Some(2)
        );
    }

    #[test]
    fn decrement_to_exactly_zero_is_allowed() {
        let catalog = catalog();
        let updated = catalog.decrement_stock("a", 5).expect("decrement");
        assert_eq!(updated.quantity, 0);
    }

    #[test]
    fn zero_and_negative_quantities_are_invalid() {
        let catalog = catalog();
        for qty in [0, -1] {
            assert!(matches!(
                catalog.decrement_stock("a", qty),
                Err(CatalogError::InvalidQuantity(q)) if q == qty
            ));
        }
        assert_eq!(catalog.list_products().expect("list")[0].quantity, 5);
    }

    #[test]
    fn quantity_is_validated_before_lookup() {
        let catalog = catalog();
        assert!(matches!(
            catalog.decrement_stock("missing", 0),
            Err(CatalogError::InvalidQuantity(0))
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let catalog = catalog();
        assert!(matches!(
            catalog.decrement_stock("missing", 1),
            Err(CatalogError::NotFound(ref id)) if id == "missing"
        ));
    }

    #[test]
    fn more_than_stock_is_insufficient() {
        let catalog = catalog();
        let err = catalog.decrement_stock("a", 6).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Not enough stock");
        assert!(matches!(
            catalog.decrement_stock("b", 1),
            Err(CatalogError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn quantity_beyond_u32_is_insufficient_not_a_panic() {
        let catalog = catalog();
        assert!(matches!(
            catalog.decrement_stock("a", i64::MAX),
            Err(CatalogError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn concurrent_decrements_never_oversell() {
        let catalog = Catalog::new(MemoryStore::new(vec![Product::new(
            "hot",
            "Hot Item",
            Decimal::new(1, 0),
            10,
        )]));

        let results: Vec<Result<Product, CatalogError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| catalog.decrement_stock("hot", 1)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let sold_out = results
            .iter()
            .filter(|r| matches!(r, Err(CatalogError::InsufficientStock { .. })))
            .count();
        assert_eq!(succeeded, 10);
        assert_eq!(sold_out, 6);
        assert_eq!(
            catalog.get_product("hot").expect("read").map(|p| p.quantity),
            Some(0)
        );
    }
}
