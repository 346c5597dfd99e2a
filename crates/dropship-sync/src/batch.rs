//! Batch entry points over [`Publisher`]: single import, multi-product
//! sync, and stock-only refresh.

use std::future::Future;

use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::capabilities::{MarketplaceApi, SupplierSource, SyncStore, TokenExchange, TokenStore};
use crate::error::SyncError;
use crate::publisher::{PublishedListing, Publisher};

/// Per-product outcomes, in the order the ids were given.
pub type BatchReport<T> = Vec<(String, Result<T, SyncError>)>;

impl<S, M, D> Publisher<S, M, D>
where
    S: SupplierSource,
    M: MarketplaceApi + TokenExchange,
    D: SyncStore + TokenStore,
{
    /// Publishes one product, using the configured markup when none is given.
    ///
    /// # Errors
    ///
    /// See [`Publisher::publish`].
    pub async fn run_import(
        &self,
        product_id: &str,
        markup_percent: Option<Decimal>,
    ) -> Result<PublishedListing, SyncError> {
        let markup_percent = markup_percent.unwrap_or(self.config.default_markup);
        self.publish(product_id, markup_percent).await
    }

    /// Re-publishes every product in `product_ids` at the default markup.
    ///
    /// One product failing never stops the others. Once `cancel` fires,
    /// products that have not started yet report [`SyncError::Cancelled`];
    /// products already in flight run to completion.
    pub async fn run_sync(
        &self,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> BatchReport<PublishedListing> {
        let markup_percent = self.config.default_markup;
        self.run_batch("sync", product_ids, cancel, move |id: String| async move {
            self.publish(&id, markup_percent).await
        })
        .await
    }

    /// Pushes current supplier stock for every product in `product_ids`.
    /// Same isolation and cancellation rules as [`Self::run_sync`].
    pub async fn run_stock_sync(
        &self,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> BatchReport<u32> {
        self.run_batch("stock sync", product_ids, cancel, move |id: String| async move {
            self.refresh_quantity(&id).await
        })
        .await
    }

    /// Ids of every product with a sync record, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Persistence`] if the store cannot be read.
    pub async fn known_product_ids(&self) -> Result<Vec<String>, SyncError> {
        let records = self.store.list_sync_records().await?;
        Ok(records
            .into_iter()
            .map(|record| record.supplier_product_id)
            .collect())
    }

    /// Drives `run_one` over owned ids so the batch future stays `Send`.
    async fn run_batch<T, F, Fut>(
        &self,
        batch: &'static str,
        product_ids: &[String],
        cancel: &CancellationToken,
        run_one: F,
    ) -> BatchReport<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let max_concurrent = self.config.max_concurrent.max(1);
        tracing::info!(batch, products = product_ids.len(), max_concurrent, "batch started");

        let entries: Vec<(usize, String)> = product_ids.iter().cloned().enumerate().collect();
        let mut results: Vec<(usize, String, Result<T, SyncError>)> = stream::iter(entries)
            .map(|(index, id)| run_entry(batch, index, id, cancel, &run_one))
            .buffer_unordered(max_concurrent)
            .collect()
            .await;
        results.sort_by_key(|(index, _, _)| *index);

        let succeeded = results.iter().filter(|(_, _, r)| r.is_ok()).count();
        let cancelled = results
            .iter()
            .filter(|(_, _, r)| matches!(r, Err(SyncError::Cancelled)))
            .count();
        let failed = results.len() - succeeded - cancelled;
        if failed > 0 {
            tracing::warn!(batch, succeeded, failed, cancelled, "batch finished with failures");
        } else {
            tracing::info!(batch, succeeded, cancelled, "batch finished");
        }

        results
            .into_iter()
            .map(|(_, id, outcome)| (id, outcome))
            .collect()
    }
}

async fn run_entry<T, F, Fut>(
    batch: &'static str,
    index: usize,
    product_id: String,
    cancel: &CancellationToken,
    run_one: &F,
) -> (usize, String, Result<T, SyncError>)
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    if cancel.is_cancelled() {
        return (index, product_id, Err(SyncError::Cancelled));
    }
    let outcome = run_one(product_id.clone()).await;
    if let Err(err) = &outcome {
        tracing::error!(
            batch,
            product_id = %product_id,
            kind = err.kind(),
            error = %err,
            "product failed"
        );
    }
    (index, product_id, outcome)
}
