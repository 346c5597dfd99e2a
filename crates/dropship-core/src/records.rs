use chrono::{DateTime, Duration, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted state of one supplier product's marketplace listing.
///
/// One record per `supplier_product_id`; later syncs overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub supplier_product_id: String,
    pub sku: String,
    pub title: String,
    /// Offer id at the marketplace. `None` until a publish succeeds.
    pub marketplace_listing_id: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub last_synced_at: DateTime<Utc>,
    /// `{"canonical": ..., "raw": ...}` audit snapshot.
    pub raw_snapshot: serde_json::Value,
}

/// Marketplace bearer token together with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// Builds a token that expires `expires_in_secs` after `now`.
    ///
    /// Returns `None` when the expiry is not a representable timestamp.
    #[must_use]
    pub fn issued_at(value: String, now: DateTime<Utc>, expires_in_secs: i64) -> Option<Self> {
        let expires_at = TimeDelta::try_seconds(expires_in_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))?;
        Some(Self { value, expires_at })
    }

    /// Returns `true` when `now` falls inside the safety margin before expiry
    /// (or past it). Such a token must be refreshed rather than used.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(safety_margin)
            .is_none_or(|refresh_at| now >= refresh_at)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
