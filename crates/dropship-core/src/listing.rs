use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marketplace-ready commercial attributes derived from a
/// [`crate::CanonicalProduct`] and the markup configuration.
///
/// Every field is recomputed from its inputs on each pipeline run; nothing
/// here is edited independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPayload {
    /// `<prefix>-<supplier id>`, e.g. `"ALI-123456"`.
    pub sku: String,
    /// Supplier title cut to the marketplace title limit.
    pub display_title: String,
    /// Marked-up price rounded to two decimal places.
    pub sell_price: Decimal,
    /// Supplier stock capped at the marketplace quantity limit.
    pub available_quantity: u32,
    pub marketplace_id: String,
    pub currency: String,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    /// Item specifics in marketplace form (`name -> [value]`).
    pub aspects: BTreeMap<String, Vec<String>>,
    /// Marketplace category, when the supplier category has a known alias.
    pub category_id: Option<String>,
}
