//! Persistence for the product catalog.
//!
//! [`KeyedStore`] is the seam between the catalog logic and its backend. The
//! shipped backends keep the whole collection in one JSON document on disk
//! ([`JsonFileStore`]) or in memory ([`MemoryStore`]).

pub mod catalog;
pub mod error;
pub mod json_file;
pub mod keyed;
pub mod memory;

pub use catalog::{Catalog, CatalogError, MAX_SWAP_ATTEMPTS};
pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use keyed::{CasOutcome, Keyed, KeyedStore};
pub use memory::MemoryStore;
