use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stock below this count is flagged as running low in listings.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A catalog entry as stored in the catalog document and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique, immutable identifier.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image URL or path, rendered as-is by clients.
    #[serde(default)]
    pub image: String,
    /// Unit price in dollars, written as a plain JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Remaining purchasable units. Never negative.
    pub quantity: u32,
    /// Fields the catalog document carries beyond the known ones. Kept so a
    /// rewrite of the document does not drop hand-edited data.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image: String::new(),
            price,
            quantity,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    #[must_use]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_quantity(self.quantity)
    }

    /// Case-insensitive substring match on name or description.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Coarse stock indicator used when rendering a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    OutOfStock,
    Low(u32),
    InStock(u32),
}

impl StockLevel {
    #[must_use]
    pub fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => StockLevel::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockLevel::Low(n),
            n => StockLevel::InStock(n),
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            StockLevel::OutOfStock => "Out of Stock".to_string(),
            StockLevel::Low(n) | StockLevel::InStock(n) => format!("{n} in stock"),
        }
    }
}
