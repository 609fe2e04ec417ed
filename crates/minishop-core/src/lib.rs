pub mod app_config;
pub mod config;
pub mod money;
pub mod payment;
pub mod products;
pub mod storefront;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use payment::{BillingDetails, CardError, CardInput, PaymentGateway, PaymentToken, TestModeGateway};
pub use products::{Product, StockLevel};
pub use storefront::{
    CartItem, LocalStorage, MemoryLocalStorage, OrderConfirmation, PaymentConfirmation,
    PurchaseHistoryEntry, Session, StorefrontError, Theme, UserProfile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
