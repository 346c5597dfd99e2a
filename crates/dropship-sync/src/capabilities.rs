//! Seams between the pipeline and the outside world.
//!
//! The live implementations delegate to the HTTP clients and the Postgres
//! pool; tests substitute in-memory fakes.

use std::future::Future;

use chrono::{DateTime, Utc};
use dropship_core::{AuthToken, SyncRecord};
use dropship_db::DbError;
use dropship_marketplace::{
    EbayClient, InventoryItemRequest, MarketplaceError, OfferRequest, Order, TokenResponse,
};
use dropship_supplier::{AliExpressClient, RawSupplierProduct, SupplierError};
use sqlx::PgPool;

pub trait SupplierSource: Send + Sync {
    fn fetch_product(
        &self,
        product_id: &str,
    ) -> impl Future<Output = Result<RawSupplierProduct, SupplierError>> + Send;
}

/// Client-credentials exchange against the marketplace identity service.
pub trait TokenExchange: Send + Sync {
    fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        scopes: &[String],
    ) -> impl Future<Output = Result<TokenResponse, MarketplaceError>> + Send;
}

/// Marketplace calls made by the publisher. Each takes a bearer token.
pub trait MarketplaceApi: Send + Sync {
    fn upsert_inventory(
        &self,
        token: &str,
        sku: &str,
        item: &InventoryItemRequest,
    ) -> impl Future<Output = Result<(), MarketplaceError>> + Send;

    fn create_offer(
        &self,
        token: &str,
        offer: &OfferRequest,
    ) -> impl Future<Output = Result<String, MarketplaceError>> + Send;

    fn find_offer_by_sku(
        &self,
        token: &str,
        sku: &str,
    ) -> impl Future<Output = Result<Option<String>, MarketplaceError>> + Send;

    fn update_offer(
        &self,
        token: &str,
        offer_id: &str,
        offer: &OfferRequest,
    ) -> impl Future<Output = Result<(), MarketplaceError>> + Send;

    fn publish_offer(
        &self,
        token: &str,
        offer_id: &str,
    ) -> impl Future<Output = Result<Option<String>, MarketplaceError>> + Send;

    fn update_quantity(
        &self,
        token: &str,
        sku: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<(), MarketplaceError>> + Send;

    fn list_orders(
        &self,
        token: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Order>, MarketplaceError>> + Send;
}

/// Durable store of sync records.
pub trait SyncStore: Send + Sync {
    fn upsert_sync_record(
        &self,
        record: &SyncRecord,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn get_sync_record(
        &self,
        supplier_product_id: &str,
    ) -> impl Future<Output = Result<Option<SyncRecord>, DbError>> + Send;

    fn list_sync_records(&self) -> impl Future<Output = Result<Vec<SyncRecord>, DbError>> + Send;

    fn update_sync_quantity(
        &self,
        supplier_product_id: &str,
        quantity: i32,
        synced_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Durable store of the marketplace access token.
pub trait TokenStore: Send + Sync {
    fn load_token(&self) -> impl Future<Output = Result<Option<AuthToken>, DbError>> + Send;

    fn save_token(&self, token: &AuthToken) -> impl Future<Output = Result<(), DbError>> + Send;
}

impl SupplierSource for AliExpressClient {
    async fn fetch_product(&self, product_id: &str) -> Result<RawSupplierProduct, SupplierError> {
        AliExpressClient::fetch_product(self, product_id).await
    }
}

impl TokenExchange for EbayClient {
    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        scopes: &[String],
    ) -> Result<TokenResponse, MarketplaceError> {
        EbayClient::request_token(self, client_id, client_secret, scopes).await
    }
}

impl MarketplaceApi for EbayClient {
    async fn upsert_inventory(
        &self,
        token: &str,
        sku: &str,
        item: &InventoryItemRequest,
    ) -> Result<(), MarketplaceError> {
        EbayClient::upsert_inventory(self, token, sku, item).await
    }

    async fn create_offer(&self, token: &str, offer: &OfferRequest) -> Result<String, MarketplaceError> {
        EbayClient::create_offer(self, token, offer).await
    }

    async fn find_offer_by_sku(
        &self,
        token: &str,
        sku: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        EbayClient::find_offer_by_sku(self, token, sku).await
    }

    async fn update_offer(
        &self,
        token: &str,
        offer_id: &str,
        offer: &OfferRequest,
    ) -> Result<(), MarketplaceError> {
        EbayClient::update_offer(self, token, offer_id, offer).await
    }

    async fn publish_offer(
        &self,
        token: &str,
        offer_id: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        EbayClient::publish_offer(self, token, offer_id).await
    }

    async fn update_quantity(
        &self,
        token: &str,
        sku: &str,
        quantity: u32,
    ) -> Result<(), MarketplaceError> {
        EbayClient::update_quantity(self, token, sku, quantity).await
    }

    async fn list_orders(&self, token: &str, limit: u32) -> Result<Vec<Order>, MarketplaceError> {
        EbayClient::list_orders(self, token, limit).await
    }
}

impl SyncStore for PgPool {
    async fn upsert_sync_record(&self, record: &SyncRecord) -> Result<(), DbError> {
        dropship_db::upsert_sync_record(self, record).await
    }

    async fn get_sync_record(&self, supplier_product_id: &str) -> Result<Option<SyncRecord>, DbError> {
        dropship_db::get_sync_record(self, supplier_product_id).await
    }

    async fn list_sync_records(&self) -> Result<Vec<SyncRecord>, DbError> {
        dropship_db::list_sync_records(self).await
    }

    async fn update_sync_quantity(
        &self,
        supplier_product_id: &str,
        quantity: i32,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        dropship_db::update_sync_quantity(self, supplier_product_id, quantity, synced_at).await
    }
}

impl TokenStore for PgPool {
    async fn load_token(&self) -> Result<Option<AuthToken>, DbError> {
        dropship_db::load_token(self, dropship_db::MARKETPLACE_TOKEN_PROVIDER).await
    }

    async fn save_token(&self, token: &AuthToken) -> Result<(), DbError> {
        dropship_db::save_token(self, dropship_db::MARKETPLACE_TOKEN_PROVIDER, token).await
    }
}
