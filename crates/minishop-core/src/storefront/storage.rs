use std::collections::HashMap;

/// Keys under which session state is persisted.
pub mod keys {
    pub const CART: &str = "cart";
    pub const PURCHASE_HISTORY: &str = "purchaseHistory";
    pub const USER_PROFILE: &str = "userProfile";
    pub const THEME: &str = "theme";
}

/// String key/value persistence with browser local-storage semantics.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an I/O error when the backing medium cannot be written.
    fn set_item(&mut self, key: &str, value: String) -> std::io::Result<()>;
}

/// Volatile storage, used by tests and one-shot sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStorage {
    items: HashMap<String, String>,
}

impl MemoryLocalStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> std::io::Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}
