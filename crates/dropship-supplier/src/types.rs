//! Supplier response types for the product-detail endpoint.
//!
//! ## Observed shape
//!
//! ```json
//! {
//!   "aliexpress_affiliate_productdetail_get_response": {
//!     "resp_result": {
//!       "result": {
//!         "products": [ { "product_id": "...", "subject": "...", ... } ]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ### Numeric fields
//! `target_sale_price` and `total_avaliable_stock` (sic) arrive as decimal
//! strings (`"9.99"`, `"50"`) but some responses carry bare JSON numbers.
//! Both are modelled as raw [`serde_json::Value`] and coerced in
//! [`crate::parse`].
//!
//! ### `image_urls`
//! A single `;`-delimited string, not an array.
//!
//! ### `sku_infos` / `specs_module`
//! Variant list and item specifics. Variants are passed through opaque;
//! specifics are flattened to `name -> text`.
//!
//! Every level is optional so that a missing path surfaces as a
//! normalization error with a precise reason instead of a generic
//! deserialization failure. Product entries stay untyped until the first one
//! is picked; a field of the wrong JSON type is coerced or dropped, never a
//! reason to reject the payload.

use serde::Deserialize;
use serde_json::Value;

/// A supplier response exactly as received, plus the id it was requested by.
///
/// The body is kept verbatim for the audit snapshot stored alongside each
/// sync record; only [`crate::normalize`] looks inside it.
#[derive(Debug, Clone)]
pub struct RawSupplierProduct {
    pub requested_id: String,
    pub body: Value,
}

/// Top-level product-detail response.
#[derive(Debug, Deserialize)]
pub struct ProductDetailEnvelope {
    #[serde(rename = "aliexpress_affiliate_productdetail_get_response")]
    pub response: Option<ProductDetailResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ProductDetailResponse {
    pub resp_result: Option<RespResult>,
}

#[derive(Debug, Deserialize)]
pub struct RespResult {
    pub resp_code: Option<Value>,
    pub resp_msg: Option<Value>,
    pub result: Option<ProductDetailResult>,
}

#[derive(Debug, Deserialize)]
pub struct ProductDetailResult {
    /// Entries are read one at a time; a malformed later entry is ignored.
    pub products: Option<Vec<Value>>,
}

/// One product entry. Only the fields listed here are read, each as raw JSON
/// and coerced in [`crate::parse`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SupplierProductEntry {
    /// String or number depending on the gateway.
    pub product_id: Option<Value>,
    pub subject: Option<Value>,
    pub description: Option<Value>,
    pub target_sale_price: Option<Value>,
    #[serde(rename = "total_avaliable_stock")]
    pub total_available_stock: Option<Value>,
    pub image_urls: Option<Value>,
    pub first_level_category_name: Option<Value>,
    pub sku_infos: Option<Value>,
    pub specs_module: Option<Value>,
}
