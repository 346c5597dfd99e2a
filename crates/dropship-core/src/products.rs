use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A supplier product translated into a marketplace-agnostic shape.
///
/// Produced once per import by the supplier normalizer and treated as
/// immutable for the rest of the pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Supplier product id, kept as a string to avoid precision loss.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Supplier sale price. Never negative; unparseable input becomes zero.
    pub price: Decimal,
    /// Total available stock. Unparseable or negative input becomes zero.
    pub quantity: u32,
    pub images: Vec<String>,
    /// Supplier variant descriptors, passed through untouched.
    pub variants: Vec<serde_json::Value>,
    /// Supplier first-level category name.
    pub category: Option<String>,
    /// Item specifics, e.g. `"Weight" -> "200g"`.
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl CanonicalProduct {
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}
