//! Background job scheduler.
//!
//! Registers the recurring listing sync at server startup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dropship_sync::{LivePublisher, SyncError};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tokio_util::sync::CancellationToken;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `sync_cron` is not a valid cron expression, or the scheduler fails to
/// start.
pub async fn build_scheduler(
    publisher: Arc<LivePublisher>,
    sync_cron: &str,
    shutdown: CancellationToken,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, publisher, sync_cron, shutdown).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring re-sync of every known product.
///
/// A tick that fires while the previous run is still going is skipped.
async fn register_sync_job(
    scheduler: &JobScheduler,
    publisher: Arc<LivePublisher>,
    sync_cron: &str,
    shutdown: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(sync_cron, move |_uuid, _lock| {
        let publisher = Arc::clone(&publisher);
        let shutdown = shutdown.clone();
        let running = Arc::clone(&running);

        Box::pin(async move {
            if shutdown.is_cancelled() {
                return;
            }
            if running.swap(true, Ordering::SeqCst) {
                tracing::warn!("scheduler: previous sync still running; skipping this tick");
                return;
            }
            tracing::info!("scheduler: starting listing sync");
            run_sync_job(&publisher, &shutdown).await;
            running.store(false, Ordering::SeqCst);
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = sync_cron, "scheduler: listing sync registered");
    Ok(())
}

/// Re-sync every product with a sync record and log the outcome per product.
async fn run_sync_job(publisher: &LivePublisher, shutdown: &CancellationToken) {
    let product_ids = match publisher.known_product_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load known products");
            return;
        }
    };

    if product_ids.is_empty() {
        tracing::info!("scheduler: no imported products; skipping");
        return;
    }

    let report = publisher
        .run_sync(&product_ids, &shutdown.child_token())
        .await;

    let mut succeeded = 0_usize;
    let mut failed = 0_usize;
    let mut cancelled = 0_usize;
    for (product_id, outcome) in &report {
        match outcome {
            Ok(listing) => {
                succeeded += 1;
                tracing::debug!(
                    product_id = %product_id,
                    offer_id = %listing.offer_id,
                    quantity = listing.available_quantity,
                    "scheduler: product synced"
                );
            }
            Err(SyncError::Cancelled) => cancelled += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    product_id = %product_id,
                    kind = e.kind(),
                    error = %e,
                    "scheduler: product sync failed"
                );
            }
        }
    }

    tracing::info!(
        total = report.len(),
        succeeded,
        failed,
        cancelled,
        "scheduler: listing sync complete"
    );
}
