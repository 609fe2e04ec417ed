use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

use crate::money::format_usd;
use crate::payment::{BillingDetails, CardInput, PaymentGateway, PaymentToken};
use crate::products::Product;

use super::storage::{keys, LocalStorage};
use super::types::{CartItem, PurchaseHistoryEntry, Theme, UserProfile};
use super::StorefrontError;

/// Upper bound of the price filter when filters are reset.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::ONE_THOUSAND;

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub total: Decimal,
    pub lines: Vec<CartItem>,
}

impl OrderConfirmation {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Order confirmed! Total: {}. Thank you for your purchase!",
            format_usd(self.total)
        )
    }
}

/// Result of a checkout paid through a [`PaymentGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub token: PaymentToken,
    pub order: OrderConfirmation,
}

impl PaymentConfirmation {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Payment successful! Order confirmed. Amount: {}",
            format_usd(self.order.total)
        )
    }
}

/// A shopper's session, persisted through a [`LocalStorage`] backend.
///
/// Mutations write through to storage before the in-memory state changes, so
/// a failed write leaves the session as it was.
pub struct Session<S: LocalStorage> {
    storage: S,
    all_products: Vec<Product>,
    filtered_products: Vec<Product>,
    cart: Vec<CartItem>,
    purchase_history: Vec<PurchaseHistoryEntry>,
    profile: UserProfile,
    theme: Theme,
}

impl<S: LocalStorage> Session<S> {
    /// Restores cart, history, profile and theme from `storage`.
    ///
    /// Missing or unreadable entries fall back to their defaults.
    pub fn load(storage: S) -> Self {
        let cart = read_json(&storage, keys::CART).unwrap_or_default();
        let purchase_history = read_json(&storage, keys::PURCHASE_HISTORY).unwrap_or_default();
        let profile = read_json(&storage, keys::USER_PROFILE).unwrap_or_default();
        let theme = storage
            .get_item(keys::THEME)
            .map(|v| Theme::from_stored(&v))
            .unwrap_or_default();

        Self {
            storage,
            all_products: Vec::new(),
            filtered_products: Vec::new(),
            cart,
            purchase_history,
            profile,
            theme,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Catalog view
    // -----------------------------------------------------------------------

    /// Replaces the catalog snapshot and clears any active filter.
    pub fn set_catalog(&mut self, products: Vec<Product>) {
        self.filtered_products.clone_from(&products);
        self.all_products = products;
    }

    pub fn all_products(&self) -> &[Product] {
        &self.all_products
    }

    /// Products visible under the current filter.
    pub fn products(&self) -> &[Product] {
        &self.filtered_products
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.all_products.iter().find(|p| p.id == id)
    }

    /// Keeps products whose name or description contains `term`
    /// (case-insensitive) and whose price is at most `max_price`.
    pub fn filter_products(&mut self, term: &str, max_price: Decimal) -> &[Product] {
        self.filtered_products = self
            .all_products
            .iter()
            .filter(|p| p.matches_search(term) && p.price <= max_price)
            .cloned()
            .collect();
        &self.filtered_products
    }

    pub fn reset_filters(&mut self) -> &[Product] {
        self.filter_products("", DEFAULT_MAX_PRICE)
    }

    // -----------------------------------------------------------------------
    // Cart
    // -----------------------------------------------------------------------

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Total units across all cart lines.
    pub fn cart_count(&self) -> u64 {
        self.cart.iter().map(|item| u64::from(item.qty)).sum()
    }

    pub fn cart_total(&self) -> Decimal {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Adds `qty` units of a catalog product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::InvalidQuantity`] when `qty` is not a positive integer.
    /// - [`StorefrontError::UnknownProduct`] when the id is not in the snapshot.
    /// - [`StorefrontError::NotEnoughStock`] when `qty` exceeds displayed stock.
    /// - [`StorefrontError::Storage`] when the cart cannot be persisted.
    pub fn add_to_cart(&mut self, product_id: &str, qty: i64) -> Result<CartItem, StorefrontError> {
        let qty = u32::try_from(qty)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(StorefrontError::InvalidQuantity)?;
        let product = self
            .find_product(product_id)
            .ok_or_else(|| StorefrontError::UnknownProduct(product_id.to_string()))?;
        if product.quantity < qty {
            return Err(StorefrontError::NotEnoughStock {
                product_id: product.id.clone(),
                requested: qty,
                available: product.quantity,
            });
        }

        let mut next = self.cart.clone();
        let line = match next.iter().position(|item| item.id == product.id) {
            Some(idx) => {
                let existing = &mut next[idx];
                existing.qty = existing.qty.saturating_add(qty);
                existing.clone()
            }
            None => {
                let item = CartItem {
                    id: product.id.clone(),
                    name: product.name.clone(),
                    price: product.price,
                    qty,
                };
                next.push(item.clone());
                item
            }
        };

        self.persist(keys::CART, &next)?;
        self.cart = next;
        tracing::debug!(product_id, qty, cart_count = self.cart_count(), "added to cart");
        Ok(line)
    }

    /// Drops the cart line for `product_id`. Returns whether a line existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Storage`] when the cart cannot be persisted.
    pub fn remove_from_cart(&mut self, product_id: &str) -> Result<bool, StorefrontError> {
        let next: Vec<CartItem> = self
            .cart
            .iter()
            .filter(|item| item.id != product_id)
            .cloned()
            .collect();
        let removed = next.len() != self.cart.len();
        self.persist(keys::CART, &next)?;
        self.cart = next;
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    /// Confirms the cart without payment: records history and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::EmptyCart`] or [`StorefrontError::Storage`].
    pub fn checkout(&mut self) -> Result<OrderConfirmation, StorefrontError> {
        self.checkout_at(Utc::now())
    }

    /// [`Session::checkout`] with an explicit order timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::EmptyCart`] or [`StorefrontError::Storage`].
    pub fn checkout_at(&mut self, now: DateTime<Utc>) -> Result<OrderConfirmation, StorefrontError> {
        if self.cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        self.record_order(now)
    }

    /// Tokenizes the card through `gateway`, then checks out.
    ///
    /// A gateway failure leaves cart, history and profile untouched.
    ///
    /// # Errors
    ///
    /// See [`Session::authorize_payment`] and [`Session::complete_payment`].
    pub fn pay_and_checkout<G: PaymentGateway + ?Sized>(
        &mut self,
        gateway: &G,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation, StorefrontError> {
        let token = self.authorize_payment(gateway, card, billing)?;
        self.complete_payment(token)
    }

    /// First half of a paid checkout: checks the cart and billing details and
    /// tokenizes the card. Nothing is recorded.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::EmptyCart`] when there is nothing to pay for.
    /// - [`StorefrontError::MissingBillingDetails`] when name or email is blank.
    /// - [`StorefrontError::Card`] when the gateway rejects the card.
    pub fn authorize_payment<G: PaymentGateway + ?Sized>(
        &self,
        gateway: &G,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentToken, StorefrontError> {
        if self.cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        if billing.name.trim().is_empty() || billing.email.trim().is_empty() {
            return Err(StorefrontError::MissingBillingDetails);
        }

        gateway.create_payment_token(card, billing).map_err(|e| {
            tracing::warn!(error = %e, "payment token creation failed");
            StorefrontError::Card(e)
        })
    }

    /// Records the order paid with `token` and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::EmptyCart`] or [`StorefrontError::Storage`].
    pub fn complete_payment(
        &mut self,
        token: PaymentToken,
    ) -> Result<PaymentConfirmation, StorefrontError> {
        if self.cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        let order = self.record_order(Utc::now())?;
        Ok(PaymentConfirmation { token, order })
    }

    fn record_order(&mut self, now: DateTime<Utc>) -> Result<OrderConfirmation, StorefrontError> {
        let lines = self.cart.clone();
        let total = self.cart_total();

        let mut history = self.purchase_history.clone();
        history.extend(lines.iter().map(|item| PurchaseHistoryEntry {
            name: item.name.clone(),
            qty: item.qty,
            total: item.line_total(),
            date: now,
        }));
        self.persist(keys::PURCHASE_HISTORY, &history)?;
        if let Err(e) = self.persist(keys::CART, &Vec::<CartItem>::new()) {
            let previous = self.purchase_history.clone();
            if let Err(restore) = self.persist(keys::PURCHASE_HISTORY, &previous) {
                tracing::error!(error = %restore, "failed to restore purchase history after cart write failure");
            }
            return Err(e);
        }

        self.purchase_history = history;
        self.cart.clear();

        tracing::info!(lines = lines.len(), total = %total, "order recorded");
        Ok(OrderConfirmation { total, lines })
    }

    // -----------------------------------------------------------------------
    // Profile, history, theme
    // -----------------------------------------------------------------------

    pub fn purchase_history(&self) -> &[PurchaseHistoryEntry] {
        &self.purchase_history
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::Storage`] when the profile cannot be persisted.
    pub fn save_profile(&mut self, profile: UserProfile) -> Result<(), StorefrontError> {
        self.persist(keys::USER_PROFILE, &profile)?;
        self.profile = profile;
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flips between light and dark and persists the choice.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Storage`] when the theme cannot be persisted.
    pub fn toggle_theme(&mut self) -> Result<Theme, StorefrontError> {
        let next = self.theme.toggled();
        self.storage
            .set_item(keys::THEME, next.as_str().to_string())
            .map_err(|source| StorefrontError::Storage {
                key: keys::THEME,
                source,
            })?;
        self.theme = next;
        Ok(next)
    }

    fn persist<T: Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), StorefrontError> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| StorefrontError::Storage {
                key,
                source: std::io::Error::other(e),
            })?;
        self.storage
            .set_item(key, encoded)
            .map_err(|source| StorefrontError::Storage { key, source })
    }
}

fn read_json<S: LocalStorage, T: DeserializeOwned>(storage: &S, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable local storage entry");
            None
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
