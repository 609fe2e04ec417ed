use crate::StoreError;

/// A record addressable by a string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for minishop_core::Product {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Outcome of [`KeyedStore::compare_and_swap`].
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome<T> {
    Swapped,
    /// The stored value differed from the expected one; nothing was written.
    /// `current` is `None` when the key no longer exists.
    Mismatch { current: Option<T> },
}

/// Ordered collection of records keyed by [`Keyed::key`].
///
/// Implementations keep insertion order stable across writes and must make
/// `compare_and_swap` atomic with respect to other writers on the same store.
pub trait KeyedStore<T: Keyed>: Send + Sync {
    /// Every record, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    fn list(&self) -> Result<Vec<T>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Replaces the record with `value.key()` in place, or appends it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read or written.
    fn put(&self, value: T) -> Result<(), StoreError>;

    /// Writes `new` only if the record stored under `key` equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read or written.
    fn compare_and_swap(&self, key: &str, expected: &T, new: T)
        -> Result<CasOutcome<T>, StoreError>;
}

impl<T: Keyed, S: KeyedStore<T> + ?Sized> KeyedStore<T> for std::sync::Arc<S> {
    fn list(&self) -> Result<Vec<T>, StoreError> {
        (**self).list()
    }

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, value: T) -> Result<(), StoreError> {
        (**self).put(value)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &T,
        new: T,
    ) -> Result<CasOutcome<T>, StoreError> {
        (**self).compare_and_swap(key, expected, new)
    }
}
