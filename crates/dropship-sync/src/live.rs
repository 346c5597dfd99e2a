//! Wiring of the pipeline against the real supplier, marketplace and
//! Postgres.

use std::sync::Arc;

use dropship_core::AppConfig;
use dropship_marketplace::{EbayClient, MarketplaceError};
use dropship_supplier::{AliExpressClient, SupplierError};
use sqlx::PgPool;
use thiserror::Error;

use crate::publisher::{Publisher, PublisherConfig};
use crate::token::{TokenManager, TokenSettings};

pub type LivePublisher = Publisher<AliExpressClient, EbayClient, PgPool>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("supplier client: {0}")]
    Supplier(#[from] SupplierError),

    #[error("marketplace client: {0}")]
    Marketplace(#[from] MarketplaceError),
}

/// Builds a publisher from configuration.
///
/// The token manager starts empty; call
/// [`TokenManager::restore`](crate::TokenManager::restore) on
/// [`Publisher::tokens`] to reuse a persisted token.
///
/// # Errors
///
/// Returns [`SetupError`] if either HTTP client cannot be built.
pub fn build_live_publisher(config: &AppConfig, pool: PgPool) -> Result<LivePublisher, SetupError> {
    let supplier = AliExpressClient::new(
        &config.supplier_base_url,
        config.http_timeout_secs,
        config.supplier_app_key.as_deref(),
    )?;
    let marketplace = Arc::new(EbayClient::new(
        &config.marketplace_base_url,
        config.http_timeout_secs,
    )?);

    let publisher_config = PublisherConfig::from_app_config(config);
    let tokens = TokenManager::new(
        Arc::clone(&marketplace),
        pool.clone(),
        TokenSettings::from_app_config(config),
        publisher_config.retry,
    );

    tracing::debug!(
        marketplace_env = %config.marketplace_env,
        marketplace_id = %config.marketplace_id,
        max_concurrent = publisher_config.max_concurrent,
        "live publisher configured"
    );

    Ok(Publisher::new(
        supplier,
        marketplace,
        pool,
        tokens,
        publisher_config,
    ))
}
