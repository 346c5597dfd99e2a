//! Listing synchronization pipeline: supplier product in, published
//! marketplace offer and persisted [`dropship_core::SyncRecord`] out.

pub mod batch;
pub mod capabilities;
pub mod error;
pub mod listing;
pub mod live;
pub mod locks;
pub mod publisher;
pub mod retry;
pub mod token;

#[cfg(test)]
pub(crate) mod fakes;

pub use batch::BatchReport;
pub use capabilities::{MarketplaceApi, SupplierSource, SyncStore, TokenExchange, TokenStore};
pub use error::SyncError;
pub use listing::{
    build_listing, category_id_for, inventory_item, offer_request, sell_price, sku_for,
    validate_markup, ListingConfig, QUANTITY_CAP, TITLE_MAX_LEN,
};
pub use live::{build_live_publisher, LivePublisher, SetupError};
pub use locks::KeyedLocks;
pub use publisher::{PublishedListing, Publisher, PublisherConfig};
pub use retry::{retry_with_backoff, Exhausted, RetryPolicy, Transient};
pub use token::{TokenManager, TokenSettings};
