use dropship_db::DbError;
use dropship_marketplace::MarketplaceError;
use dropship_supplier::SupplierError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::retry::Exhausted;

/// Failure of one product's pipeline run.
///
/// Variants that wrap a retried call carry the number of attempts made.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("supplier fetch failed after {attempts} attempt(s): {source}")]
    Supplier {
        attempts: u32,
        #[source]
        source: SupplierError,
    },

    #[error("supplier payload rejected: {0}")]
    Normalization(#[source] SupplierError),

    #[error("marketplace token exchange failed after {attempts} attempt(s): {source}")]
    Auth {
        attempts: u32,
        #[source]
        source: MarketplaceError,
    },

    #[error("inventory update for {sku} failed after {attempts} attempt(s): {source}")]
    Inventory {
        sku: String,
        attempts: u32,
        #[source]
        source: MarketplaceError,
    },

    #[error("offer creation for {sku} failed after {attempts} attempt(s): {source}")]
    OfferCreation {
        sku: String,
        attempts: u32,
        #[source]
        source: MarketplaceError,
    },

    #[error("publishing offer {offer_id} failed after {attempts} attempt(s): {source}")]
    Publish {
        offer_id: String,
        attempts: u32,
        #[source]
        source: MarketplaceError,
    },

    #[error("listing orders failed after {attempts} attempt(s): {source}")]
    Orders {
        attempts: u32,
        #[source]
        source: MarketplaceError,
    },

    #[error("persistence failed: {0}")]
    Persistence(#[from] DbError),

    #[error("markup percent must be non-negative, got {0}")]
    InvalidMarkup(Decimal),

    #[error("sell price for product {product_id} overflows: price {price} with markup {markup_percent}%")]
    Pricing {
        product_id: String,
        price: Decimal,
        markup_percent: Decimal,
    },

    #[error("cancelled before the product was started")]
    Cancelled,
}

impl SyncError {
    pub(crate) fn supplier(err: Exhausted<SupplierError>) -> Self {
        SyncError::Supplier {
            attempts: err.attempts,
            source: err.source,
        }
    }

    pub(crate) fn auth(err: Exhausted<MarketplaceError>) -> Self {
        SyncError::Auth {
            attempts: err.attempts,
            source: err.source,
        }
    }

    pub(crate) fn inventory(sku: &str, err: Exhausted<MarketplaceError>) -> Self {
        SyncError::Inventory {
            sku: sku.to_owned(),
            attempts: err.attempts,
            source: err.source,
        }
    }

    pub(crate) fn offer_creation(sku: &str, err: Exhausted<MarketplaceError>) -> Self {
        SyncError::OfferCreation {
            sku: sku.to_owned(),
            attempts: err.attempts,
            source: err.source,
        }
    }

    pub(crate) fn publish(offer_id: &str, err: Exhausted<MarketplaceError>) -> Self {
        SyncError::Publish {
            offer_id: offer_id.to_owned(),
            attempts: err.attempts,
            source: err.source,
        }
    }

    pub(crate) fn orders(err: Exhausted<MarketplaceError>) -> Self {
        SyncError::Orders {
            attempts: err.attempts,
            source: err.source,
        }
    }

    /// Attempts made by the failing step, when it was a retried call.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            SyncError::Supplier { attempts, .. }
            | SyncError::Auth { attempts, .. }
            | SyncError::Inventory { attempts, .. }
            | SyncError::OfferCreation { attempts, .. }
            | SyncError::Publish { attempts, .. }
            | SyncError::Orders { attempts, .. } => Some(*attempts),
            SyncError::Normalization(_)
            | SyncError::Persistence(_)
            | SyncError::InvalidMarkup(_)
            | SyncError::Pricing { .. }
            | SyncError::Cancelled => None,
        }
    }

    /// Stable machine-readable name of the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Supplier { .. } => "supplier",
            SyncError::Normalization(_) => "normalization",
            SyncError::Auth { .. } => "auth",
            SyncError::Inventory { .. } => "inventory",
            SyncError::OfferCreation { .. } => "offer_creation",
            SyncError::Publish { .. } => "publish",
            SyncError::Orders { .. } => "orders",
            SyncError::Persistence(_) => "persistence",
            SyncError::InvalidMarkup(_) => "invalid_markup",
            SyncError::Pricing { .. } => "pricing",
            SyncError::Cancelled => "cancelled",
        }
    }
}
