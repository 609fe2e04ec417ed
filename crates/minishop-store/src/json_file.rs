//! Whole-document JSON persistence.
//!
//! The collection is a single JSON array. Every read parses the file from
//! disk; every write replaces the file by writing a sibling temp file and
//! renaming it over the original, so readers observe either the old or the
//! new document.

use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::keyed::{CasOutcome, Keyed, KeyedStore};
use crate::StoreError;

/// A [`KeyedStore`] over one JSON array document.
///
/// Writers through the same instance are serialized; separate processes or
/// separate instances pointing at one file are not coordinated.
pub struct JsonFileStore<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Keyed + Clone + PartialEq + Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn read_document(&self) -> Result<Vec<T>, StoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.display_path(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.display_path(),
            source,
        })
    }

    fn write_document(&self, records: &[T]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(records).map_err(StoreError::Encode)?;
        let tmp_path = self.temp_path();
        let io_err = |source| StoreError::Io {
            path: tmp_path.display().to_string(),
            source,
        };

        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(encoded.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.display_path(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "document written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<T> KeyedStore<T> for JsonFileStore<T>
where
    T: Keyed + Clone + PartialEq + Serialize + DeserializeOwned,
{
    fn list(&self) -> Result<Vec<T>, StoreError> {
        self.read_document()
    }

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.read_document()?.into_iter().find(|r| r.key() == key))
    }

    fn put(&self, value: T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = self.read_document()?;
        match records.iter().position(|r| r.key() == value.key()) {
            Some(idx) => records[idx] = value,
            None => records.push(value),
        }
        self.write_document(&records)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &T,
        new: T,
    ) -> Result<CasOutcome<T>, StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = self.read_document()?;
        let Some(idx) = records.iter().position(|r| r.key() == key) else {
            return Ok(CasOutcome::Mismatch { current: None });
        };
        if &records[idx] != expected {
            return Ok(CasOutcome::Mismatch {
                current: Some(records[idx].clone()),
            });
        }
        records[idx] = new;
        self.write_document(&records)?;
        Ok(CasOutcome::Swapped)
    }
}
