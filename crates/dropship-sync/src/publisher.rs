//! The listing pipeline for one supplier product.
//!
//! Steps, each network call individually retried:
//!
//! 1. fetch the raw supplier product
//! 2. normalize it (never retried)
//! 3. make sure a marketplace token is usable
//! 4. build the listing
//! 5. upsert the inventory item by SKU
//! 6. create the offer, or update the existing one for this SKU
//! 7. publish the offer
//! 8. persist the sync record
//!
//! A failure after step 2 aborts the run without persisting. Marketplace
//! side effects already made stay in place; because steps 5 to 7 are keyed
//! by the deterministic SKU, re-running the pipeline converges.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use dropship_core::{AppConfig, SyncRecord};
use dropship_db::DbError;
use dropship_marketplace::{MarketplaceError, OfferRequest, Order};
use dropship_supplier::normalize_product;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::capabilities::{MarketplaceApi, SupplierSource, SyncStore, TokenExchange, TokenStore};
use crate::error::SyncError;
use crate::listing::{
    build_listing, inventory_item, offer_request, validate_markup, ListingConfig, QUANTITY_CAP,
};
use crate::locks::KeyedLocks;
use crate::retry::{retry_with_backoff, Exhausted, RetryPolicy};
use crate::token::TokenManager;

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub listing: ListingConfig,
    pub retry: RetryPolicy,
    pub default_markup: Decimal,
    pub max_concurrent: usize,
}

impl PublisherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            listing: ListingConfig::from_app_config(config),
            retry: RetryPolicy::from_app_config(config),
            default_markup: config.markup_percent,
            max_concurrent: config.sync_max_concurrent.max(1),
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedListing {
    pub supplier_product_id: String,
    pub sku: String,
    /// Marketplace offer id; this is the id persisted on the sync record.
    pub offer_id: String,
    /// Listing id reported by the publish call, when there is one.
    pub listing_id: Option<String>,
    pub sell_price: Decimal,
    pub available_quantity: u32,
}

pub struct Publisher<S, M, D> {
    pub(crate) supplier: S,
    pub(crate) marketplace: Arc<M>,
    pub(crate) store: D,
    pub(crate) tokens: TokenManager<M, D>,
    pub(crate) locks: KeyedLocks,
    pub(crate) config: PublisherConfig,
}

impl<S, M, D> Publisher<S, M, D>
where
    S: SupplierSource,
    M: MarketplaceApi + TokenExchange,
    D: SyncStore + TokenStore,
{
    pub fn new(
        supplier: S,
        marketplace: Arc<M>,
        store: D,
        tokens: TokenManager<M, D>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            supplier,
            marketplace,
            store,
            tokens,
            locks: KeyedLocks::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager<M, D> {
        &self.tokens
    }

    /// Runs the full pipeline for `product_id` with `markup_percent`.
    ///
    /// At most one publish or quantity refresh runs per product id at a time.
    ///
    /// # Errors
    ///
    /// Returns the [`SyncError`] of the first step that failed. Nothing is
    /// persisted unless every marketplace step succeeded.
    pub async fn publish(
        &self,
        product_id: &str,
        markup_percent: Decimal,
    ) -> Result<PublishedListing, SyncError> {
        let markup_percent = validate_markup(markup_percent)?;
        let _guard = self.locks.lock(product_id).await;
        tracing::info!(product_id, %markup_percent, "publishing supplier product");

        let raw = retry_with_backoff(&self.config.retry, "fetch supplier product", || {
            self.supplier.fetch_product(product_id)
        })
        .await
        .map_err(SyncError::supplier)?;

        let product = normalize_product(&raw).map_err(SyncError::Normalization)?;

        let listing = build_listing(&product, markup_percent, &self.config.listing)?;
        let sku = listing.sku.as_str();

        let item = inventory_item(&listing);
        self.marketplace_call(
            "upsert inventory item",
            |token| {
                let marketplace = &self.marketplace;
                let item = &item;
                async move { marketplace.upsert_inventory(&token, sku, item).await }
            },
            |err| SyncError::inventory(sku, err),
        )
        .await?;

        let offer = offer_request(&listing);
        let offer_id = self.create_or_update_offer(&offer).await?;

        let listing_id = self
            .marketplace_call(
                "publish offer",
                |token| {
                    let marketplace = &self.marketplace;
                    let offer_id = offer_id.as_str();
                    async move { marketplace.publish_offer(&token, offer_id).await }
                },
                |err| SyncError::publish(&offer_id, err),
            )
            .await?;

        // Keyed by the requested id, the same key the lock and later stock
        // refreshes use; the SKU follows the id the supplier reported.
        let record = SyncRecord {
            supplier_product_id: product_id.to_owned(),
            sku: listing.sku.clone(),
            title: listing.display_title.clone(),
            marketplace_listing_id: Some(offer_id.clone()),
            price: listing.sell_price,
            quantity: quantity_column(listing.available_quantity),
            last_synced_at: Utc::now(),
            raw_snapshot: serde_json::json!({
                "canonical": &product,
                "raw": &raw.body,
            }),
        };
        self.store.upsert_sync_record(&record).await?;

        tracing::info!(
            product_id,
            sku,
            offer_id = %offer_id,
            listing_id = listing_id.as_deref().unwrap_or(""),
            sell_price = %listing.sell_price,
            quantity = listing.available_quantity,
            "listing published"
        );

        Ok(PublishedListing {
            supplier_product_id: product_id.to_owned(),
            sku: listing.sku.clone(),
            offer_id,
            listing_id,
            sell_price: listing.sell_price,
            available_quantity: listing.available_quantity,
        })
    }

    /// Pushes the current supplier stock of an already imported product to
    /// the marketplace and records it. Returns the quantity offered.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Persistence`] with [`DbError::NotFound`] if the product
    ///   was never imported.
    /// - [`SyncError::Supplier`] or [`SyncError::Normalization`] if the
    ///   supplier product cannot be read.
    /// - [`SyncError::Inventory`] if the marketplace rejects the update.
    pub async fn refresh_quantity(&self, product_id: &str) -> Result<u32, SyncError> {
        let _guard = self.locks.lock(product_id).await;

        let record = self
            .store
            .get_sync_record(product_id)
            .await?
            .ok_or(SyncError::Persistence(DbError::NotFound))?;

        let raw = retry_with_backoff(&self.config.retry, "fetch supplier product", || {
            self.supplier.fetch_product(product_id)
        })
        .await
        .map_err(SyncError::supplier)?;
        let product = normalize_product(&raw).map_err(SyncError::Normalization)?;
        let quantity = product.quantity.min(QUANTITY_CAP);
        let sku = record.sku.as_str();

        self.marketplace_call(
            "update quantity",
            |token| {
                let marketplace = &self.marketplace;
                async move { marketplace.update_quantity(&token, sku, quantity).await }
            },
            |err| SyncError::inventory(sku, err),
        )
        .await?;

        self.store
            .update_sync_quantity(product_id, quantity_column(quantity), Utc::now())
            .await?;

        tracing::info!(
            product_id,
            sku,
            previous = record.quantity,
            quantity,
            "quantity refreshed"
        );
        Ok(quantity)
    }

    /// Lists recent marketplace orders.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Auth`] or [`SyncError::Orders`].
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, SyncError> {
        self.marketplace_call(
            "list orders",
            |token| {
                let marketplace = &self.marketplace;
                async move { marketplace.list_orders(&token, limit).await }
            },
            SyncError::orders,
        )
        .await
    }

    /// Creates the offer; when the marketplace already has one for the SKU,
    /// finds it and updates it in place instead.
    async fn create_or_update_offer(&self, offer: &OfferRequest) -> Result<String, SyncError> {
        let sku = offer.sku.as_str();
        let created = self
            .marketplace_call(
                "create offer",
                |token| {
                    let marketplace = &self.marketplace;
                    async move { marketplace.create_offer(&token, offer).await }
                },
                |err| SyncError::offer_creation(sku, err),
            )
            .await;

        match created {
            Ok(offer_id) => Ok(offer_id),
            Err(SyncError::OfferCreation {
                source: MarketplaceError::OfferExists { .. },
                ..
            }) => {
                tracing::info!(sku, "offer already exists; updating it");
                let existing = self
                    .marketplace_call(
                        "find offer by sku",
                        |token| {
                            let marketplace = &self.marketplace;
                            async move { marketplace.find_offer_by_sku(&token, sku).await }
                        },
                        |err| SyncError::offer_creation(sku, err),
                    )
                    .await?;

                let offer_id = existing.ok_or_else(|| SyncError::OfferCreation {
                    sku: sku.to_owned(),
                    attempts: 1,
                    source: MarketplaceError::MissingField {
                        context: format!("get offers {sku}"),
                        field: "offerId",
                    },
                })?;

                self.marketplace_call(
                    "update offer",
                    |token| {
                        let marketplace = &self.marketplace;
                        let offer_id = offer_id.as_str();
                        async move { marketplace.update_offer(&token, offer_id, offer).await }
                    },
                    |err| SyncError::offer_creation(sku, err),
                )
                .await?;
                Ok(offer_id)
            }
            Err(err) => Err(err),
        }
    }

    /// Runs one retried marketplace call with a usable token.
    ///
    /// The token is checked before the call. A 401 drops the cached token so
    /// the next call exchanges for a fresh one.
    async fn marketplace_call<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
        on_failure: impl FnOnce(Exhausted<MarketplaceError>) -> SyncError,
    ) -> Result<T, SyncError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, MarketplaceError>>,
    {
        let token = self.tokens.access_token().await?;
        match retry_with_backoff(&self.config.retry, operation, || call(token.clone())).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.source.status() == Some(401) {
                    tracing::warn!(operation, "marketplace rejected token; invalidating");
                    self.tokens.invalidate().await;
                }
                Err(on_failure(err))
            }
        }
    }
}

/// Quantities are capped well below `i32::MAX`; saturate anyway.
fn quantity_column(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[path = "publisher_test.rs"]
mod tests;
