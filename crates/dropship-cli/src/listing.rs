//! Import, sync and order command handlers.
//!
//! Each handler builds the live publisher, restores a persisted marketplace
//! token when one is still usable, and prints a plain-text summary.

use anyhow::Context;
use dropship_core::AppConfig;
use dropship_marketplace::Order;
use dropship_sync::{BatchReport, LivePublisher, SyncError};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

async fn publisher(config: &AppConfig, pool: PgPool) -> anyhow::Result<LivePublisher> {
    let publisher =
        dropship_sync::build_live_publisher(config, pool).context("building live publisher")?;
    match publisher.tokens().restore().await {
        Ok(true) => tracing::info!("reusing persisted marketplace token"),
        Ok(false) => {}
        Err(err) => tracing::warn!(error = %err, "could not load persisted marketplace token"),
    }
    Ok(publisher)
}

/// Imports and publishes a single product.
///
/// # Errors
///
/// Returns an error if the pipeline fails at any step.
pub(crate) async fn run_import(
    config: &AppConfig,
    pool: PgPool,
    product_id: &str,
    markup: Option<Decimal>,
) -> anyhow::Result<()> {
    let publisher = publisher(config, pool).await?;
    let listing = publisher
        .run_import(product_id, markup)
        .await
        .with_context(|| format!("importing product {product_id}"))?;

    println!(
        "published {} as {} (offer {}, listing {}) at {} x{}",
        listing.supplier_product_id,
        listing.sku,
        listing.offer_id,
        listing.listing_id.as_deref().unwrap_or("\u{2014}"),
        listing.sell_price,
        listing.available_quantity
    );
    Ok(())
}

/// Re-syncs `product_ids`, or every known product when empty.
///
/// Ctrl-C stops products that have not started yet.
///
/// # Errors
///
/// Returns an error if the known products cannot be listed or if any
/// product failed.
pub(crate) async fn run_sync(
    config: &AppConfig,
    pool: PgPool,
    product_ids: Vec<String>,
    stock_only: bool,
) -> anyhow::Result<()> {
    let publisher = publisher(config, pool).await?;
    let product_ids = if product_ids.is_empty() {
        publisher.known_product_ids().await?
    } else {
        product_ids
    };
    if product_ids.is_empty() {
        println!("no products to sync; run `import` first");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; finishing in-flight products");
                cancel.cancel();
            }
        })
    };

    let failed = if stock_only {
        let report = publisher.run_stock_sync(&product_ids, &cancel).await;
        print_report(&report, |quantity| format!("quantity {quantity}"))
    } else {
        let report = publisher.run_sync(&product_ids, &cancel).await;
        print_report(&report, |listing| {
            format!("offer {} at {}", listing.offer_id, listing.sell_price)
        })
    };
    watcher.abort();

    if failed > 0 {
        anyhow::bail!("{failed} of {} products failed", product_ids.len());
    }
    Ok(())
}

/// Prints one line per product and returns the number of failures.
pub(crate) fn print_report<T>(report: &BatchReport<T>, describe: impl Fn(&T) -> String) -> usize {
    let header = format!("{:<24}{:<10}DETAIL", "PRODUCT", "RESULT");
    println!("{header}");
    let mut failed = 0;
    for (product_id, outcome) in report {
        let (result, detail) = report_line(outcome, &describe);
        if outcome.is_err() {
            failed += 1;
        }
        println!("{product_id:<24}{result:<10}{detail}");
    }
    failed
}

pub(crate) fn report_line<T>(
    outcome: &Result<T, SyncError>,
    describe: impl Fn(&T) -> String,
) -> (&'static str, String) {
    match outcome {
        Ok(value) => ("ok", describe(value)),
        Err(SyncError::Cancelled) => ("skipped", "cancelled before start".to_string()),
        Err(err) => (err.kind(), err.to_string()),
    }
}

/// Lists recent marketplace orders.
///
/// # Errors
///
/// Returns an error if the marketplace call fails.
pub(crate) async fn run_orders(config: &AppConfig, pool: PgPool, limit: u32) -> anyhow::Result<()> {
    let publisher = publisher(config, pool).await?;
    let orders = publisher.recent_orders(limit).await?;
    if orders.is_empty() {
        println!("no orders found");
        return Ok(());
    }

    let header = format!("{:<22}{:<22}{:<14}ITEMS", "ORDER", "CREATED", "FULFILLMENT");
    println!("{header}");
    for order in &orders {
        println!(
            "{:<22}{:<22}{:<14}{}",
            order.order_id,
            order.creation_date.as_deref().unwrap_or("\u{2014}"),
            order.order_fulfillment_status.as_deref().unwrap_or("\u{2014}"),
            order_items(order)
        );
    }
    Ok(())
}

pub(crate) fn order_items(order: &Order) -> String {
    order
        .line_items
        .iter()
        .map(|item| {
            format!(
                "{} x{}",
                item.sku.as_deref().unwrap_or("?"),
                item.quantity.unwrap_or(0)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
