use parking_lot::RwLock;

use crate::keyed::{CasOutcome, Keyed, KeyedStore};
use crate::StoreError;

/// In-process [`KeyedStore`]; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T> MemoryStore<T> {
    #[must_use]
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl<T> KeyedStore<T> for MemoryStore<T>
where
    T: Keyed + Clone + PartialEq + Send + Sync,
{
    fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.read().clone())
    }

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.records.read().iter().find(|r| r.key() == key).cloned())
    }

    fn put(&self, value: T) -> Result<(), StoreError> {
        let mut records = self.records.write();
        match records.iter().position(|r| r.key() == value.key()) {
            Some(idx) => records[idx] = value,
            None => records.push(value),
        }
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &T,
        new: T,
    ) -> Result<CasOutcome<T>, StoreError> {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.key() == key) {
            None => Ok(CasOutcome::Mismatch { current: None }),
            Some(current) if current != expected => Ok(CasOutcome::Mismatch {
                current: Some(current.clone()),
            }),
            Some(current) => {
                *current = new;
                Ok(CasOutcome::Swapped)
            }
        }
    }
}
