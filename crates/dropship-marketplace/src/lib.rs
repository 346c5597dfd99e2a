pub mod client;
pub mod error;
pub mod types;

pub use client::EbayClient;
pub use error::MarketplaceError;
pub use types::{
    Amount, Availability, InventoryItemRequest, InventoryProduct, OfferRequest, OfferSummary,
    Order, OrderLineItem, PricingSummary, ShipToLocationAvailability, TokenResponse,
};
