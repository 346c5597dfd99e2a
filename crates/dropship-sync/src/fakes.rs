//! In-memory stand-ins for the capability traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dropship_core::{AuthToken, SyncRecord};
use dropship_db::DbError;
use dropship_marketplace::{
    InventoryItemRequest, MarketplaceError, OfferRequest, Order, TokenResponse,
};
use dropship_supplier::{RawSupplierProduct, SupplierError};
use serde_json::{json, Value};

use crate::capabilities::{MarketplaceApi, SupplierSource, SyncStore, TokenExchange, TokenStore};

pub(crate) fn product_body(id: &str, price: &str, stock: &str) -> Value {
    json!({
        "aliexpress_affiliate_productdetail_get_response": {
            "resp_result": {
                "resp_code": 200,
                "result": {
                    "products": [{
                        "product_id": id,
                        "subject": format!("Sim Product {id}"),
                        "description": "Sample description",
                        "target_sale_price": price,
                        "total_avaliable_stock": stock,
                        "image_urls": "https://img.test/1.jpg;https://img.test/2.jpg",
                        "first_level_category_name": "Consumer Electronics"
                    }]
                }
            }
        }
    })
}

pub(crate) fn status_error(status: u16) -> MarketplaceError {
    MarketplaceError::Status {
        status,
        context: "fake".to_string(),
        body: String::new(),
    }
}

#[derive(Default)]
pub(crate) struct FakeSupplier {
    bodies: Mutex<HashMap<String, Value>>,
    failures: Mutex<VecDeque<SupplierError>>,
    pub calls: AtomicU32,
}

impl FakeSupplier {
    pub(crate) fn with_product(id: &str, price: &str, stock: &str) -> Self {
        let supplier = Self::default();
        supplier.set_product(id, price, stock);
        supplier
    }

    pub(crate) fn set_product(&self, id: &str, price: &str, stock: &str) {
        self.set_body(id, product_body(id, price, stock));
    }

    pub(crate) fn set_body(&self, id: &str, body: Value) {
        self.bodies.lock().unwrap().insert(id.to_string(), body);
    }

    /// Queues errors returned, in order, before any body is served.
    pub(crate) fn fail_next(&self, err: SupplierError) {
        self.failures.lock().unwrap().push_back(err);
    }
}

impl SupplierSource for FakeSupplier {
    async fn fetch_product(&self, product_id: &str) -> Result<RawSupplierProduct, SupplierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let body = self.bodies.lock().unwrap().get(product_id).cloned();
        match body {
            Some(body) => Ok(RawSupplierProduct {
                requested_id: product_id.to_string(),
                body,
            }),
            None => Err(SupplierError::NotFound {
                url: format!("fake://product/{product_id}"),
            }),
        }
    }
}

/// Marketplace that behaves like the real one for offers: creating a second
/// offer for the same SKU is rejected as already existing.
pub(crate) struct FakeMarketplace {
    pub inventory: Mutex<HashMap<String, InventoryItemRequest>>,
    pub offers: Mutex<HashMap<String, (String, OfferRequest)>>,
    pub published: Mutex<Vec<String>>,
    pub quantities: Mutex<HashMap<String, u32>>,
    pub tokens_seen: Mutex<Vec<String>>,
    pub token_requests: AtomicU32,
    pub token_expires_in: AtomicI64,
    failures: Mutex<HashMap<&'static str, VecDeque<MarketplaceError>>>,
    next_offer: AtomicU32,
}

impl Default for FakeMarketplace {
    fn default() -> Self {
        Self {
            inventory: Mutex::default(),
            offers: Mutex::default(),
            published: Mutex::default(),
            quantities: Mutex::default(),
            tokens_seen: Mutex::default(),
            token_requests: AtomicU32::new(0),
            token_expires_in: AtomicI64::new(7200),
            failures: Mutex::default(),
            next_offer: AtomicU32::new(5000),
        }
    }
}

impl FakeMarketplace {
    /// Queues an error for the next call of `operation`
    /// (`token`, `inventory`, `create_offer`, `find_offer`, `update_offer`,
    /// `publish`, `quantity`, `orders`).
    pub(crate) fn fail_next(&self, operation: &'static str, err: MarketplaceError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(err);
    }

    pub(crate) fn offer_for(&self, sku: &str) -> Option<(String, OfferRequest)> {
        self.offers.lock().unwrap().get(sku).cloned()
    }

    fn take_failure(&self, operation: &'static str) -> Result<(), MarketplaceError> {
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn saw_token(&self, token: &str) {
        self.tokens_seen.lock().unwrap().push(token.to_string());
    }
}

impl TokenExchange for FakeMarketplace {
    async fn request_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        _scopes: &[String],
    ) -> Result<TokenResponse, MarketplaceError> {
        let n = self.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
        self.take_failure("token")?;
        Ok(TokenResponse {
            access_token: format!("tok-{n}"),
            expires_in: self.token_expires_in.load(Ordering::SeqCst),
            token_type: None,
        })
    }
}

impl MarketplaceApi for FakeMarketplace {
    async fn upsert_inventory(
        &self,
        token: &str,
        sku: &str,
        item: &InventoryItemRequest,
    ) -> Result<(), MarketplaceError> {
        self.saw_token(token);
        self.take_failure("inventory")?;
        self.inventory
            .lock()
            .unwrap()
            .insert(sku.to_string(), item.clone());
        Ok(())
    }

    async fn create_offer(&self, token: &str, offer: &OfferRequest) -> Result<String, MarketplaceError> {
        self.saw_token(token);
        self.take_failure("create_offer")?;
        let mut offers = self.offers.lock().unwrap();
        if offers.contains_key(&offer.sku) {
            return Err(MarketplaceError::OfferExists {
                sku: offer.sku.clone(),
            });
        }
        let id = self.next_offer.fetch_add(1, Ordering::SeqCst).to_string();
        offers.insert(offer.sku.clone(), (id.clone(), offer.clone()));
        Ok(id)
    }

    async fn find_offer_by_sku(
        &self,
        token: &str,
        sku: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        self.saw_token(token);
        self.take_failure("find_offer")?;
        Ok(self.offer_for(sku).map(|(id, _)| id))
    }

    async fn update_offer(
        &self,
        token: &str,
        offer_id: &str,
        offer: &OfferRequest,
    ) -> Result<(), MarketplaceError> {
        self.saw_token(token);
        self.take_failure("update_offer")?;
        self.offers
            .lock()
            .unwrap()
            .insert(offer.sku.clone(), (offer_id.to_string(), offer.clone()));
        Ok(())
    }

    async fn publish_offer(
        &self,
        token: &str,
        offer_id: &str,
    ) -> Result<Option<String>, MarketplaceError> {
        self.saw_token(token);
        self.take_failure("publish")?;
        self.published.lock().unwrap().push(offer_id.to_string());
        Ok(Some(format!("listing-{offer_id}")))
    }

    async fn update_quantity(
        &self,
        token: &str,
        sku: &str,
        quantity: u32,
    ) -> Result<(), MarketplaceError> {
        self.saw_token(token);
        self.take_failure("quantity")?;
        self.quantities
            .lock()
            .unwrap()
            .insert(sku.to_string(), quantity);
        Ok(())
    }

    async fn list_orders(&self, token: &str, _limit: u32) -> Result<Vec<Order>, MarketplaceError> {
        self.saw_token(token);
        self.take_failure("orders")?;
        Ok(vec![])
    }
}

#[derive(Default)]
struct MemoryInner {
    records: Mutex<HashMap<String, SyncRecord>>,
    token: Mutex<Option<AuthToken>>,
    fail_writes: Mutex<bool>,
}

/// Shared in-memory store; clones see the same data.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub(crate) fn record(&self, id: &str) -> Option<SyncRecord> {
        self.inner.records.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn insert_record(&self, record: SyncRecord) {
        self.inner
            .records
            .lock()
            .unwrap()
            .insert(record.supplier_product_id.clone(), record);
    }

    pub(crate) fn stored_token(&self) -> Option<AuthToken> {
        self.inner.token.lock().unwrap().clone()
    }

    pub(crate) fn set_token(&self, token: AuthToken) {
        *self.inner.token.lock().unwrap() = Some(token);
    }

    pub(crate) fn fail_writes(&self) {
        *self.inner.fail_writes.lock().unwrap() = true;
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if *self.inner.fail_writes.lock().unwrap() {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl SyncStore for MemoryStore {
    async fn upsert_sync_record(&self, record: &SyncRecord) -> Result<(), DbError> {
        self.check_writable()?;
        self.insert_record(record.clone());
        Ok(())
    }

    async fn get_sync_record(&self, supplier_product_id: &str) -> Result<Option<SyncRecord>, DbError> {
        Ok(self.record(supplier_product_id))
    }

    async fn list_sync_records(&self) -> Result<Vec<SyncRecord>, DbError> {
        let mut records: Vec<SyncRecord> =
            self.inner.records.lock().unwrap().values().cloned().collect();
        records.sort_by(|a, b| a.supplier_product_id.cmp(&b.supplier_product_id));
        Ok(records)
    }

    async fn update_sync_quantity(
        &self,
        supplier_product_id: &str,
        quantity: i32,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.check_writable()?;
        let mut records = self.inner.records.lock().unwrap();
        let record = records
            .get_mut(supplier_product_id)
            .ok_or(DbError::NotFound)?;
        record.quantity = quantity;
        record.last_synced_at = synced_at;
        Ok(())
    }
}

impl TokenStore for MemoryStore {
    async fn load_token(&self) -> Result<Option<AuthToken>, DbError> {
        Ok(self.stored_token())
    }

    async fn save_token(&self, token: &AuthToken) -> Result<(), DbError> {
        self.check_writable()?;
        self.set_token(token.clone());
        Ok(())
    }
}
