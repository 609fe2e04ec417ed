//! Client-side storefront state: catalog snapshot, search filter, cart,
//! purchase history, profile and theme.
//!
//! Everything here runs against an in-memory copy of the catalog fetched once
//! by the client. Checkout never decrements server stock on its own; callers
//! that want that must call the purchase endpoint themselves.

mod session;
mod storage;
mod types;

pub use session::{OrderConfirmation, PaymentConfirmation, Session, DEFAULT_MAX_PRICE};
pub use storage::{keys, LocalStorage, MemoryLocalStorage};
pub use types::{CartItem, PurchaseHistoryEntry, Theme, UserProfile};

use thiserror::Error;

use crate::payment::CardError;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please enter a valid quantity")]
    InvalidQuantity,
    #[error("Not enough stock")]
    NotEnoughStock { product_id: String, requested: u32, available: u32 },
    #[error("product '{0}' is not in the catalog")]
    UnknownProduct(String),
    #[error("Please fill in all fields")]
    MissingBillingDetails,
    #[error(transparent)]
    Card(#[from] CardError),
    #[error("local storage write failed for '{key}': {source}")]
    Storage {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },
}
