//! Wire types for the marketplace Sell APIs.
//!
//! Request types serialize to the camelCase JSON the Inventory API expects.
//! Response types are lenient: every field the workflow does not strictly
//! need is optional.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Client-credentials grant response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds. The identity service omits it on some sandbox
    /// responses; two hours is its documented default.
    #[serde(default = "TokenResponse::default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    fn default_expires_in() -> i64 {
        7200
    }
}

/// Body of `PUT /sell/inventory/v1/inventory_item/{sku}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItemRequest {
    pub availability: Availability,
    pub condition: String,
    pub product: InventoryProduct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipToLocationAvailability {
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    pub aspects: BTreeMap<String, Vec<String>>,
}

/// Body of `POST /sell/inventory/v1/offer` and `PUT /sell/inventory/v1/offer/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub sku: String,
    pub marketplace_id: String,
    pub format: String,
    pub available_quantity: u32,
    pub pricing_summary: PricingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSummary {
    pub price: Amount,
}

/// Money as the Sell APIs carry it: a decimal string plus currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOfferResponse {
    pub offer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublishOfferResponse {
    pub listing_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSummary {
    pub offer_id: Option<String>,
    pub sku: Option<String>,
    pub marketplace_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfferSearchResponse {
    #[serde(default)]
    pub offers: Vec<OfferSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkPriceQuantityRequest {
    pub requests: Vec<PriceQuantityEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceQuantityEntry {
    pub sku: String,
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkPriceQuantityResponse {
    #[serde(default)]
    pub responses: Vec<PriceQuantityResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceQuantityResult {
    pub status_code: Option<u16>,
    pub sku: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Error body shared by the Sell APIs: `{"errors": [{"errorId": ..., "message": ...}]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorDetail {
    pub error_id: Option<i64>,
    pub message: Option<String>,
}

/// One order from the fulfillment API, trimmed to what the CLI reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub creation_date: Option<String>,
    pub order_fulfillment_status: Option<String>,
    pub order_payment_status: Option<String>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderSearchResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}
