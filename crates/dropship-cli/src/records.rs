//! Read-only record queries and the affiliate link helper.

use anyhow::Context;
use dropship_core::AppConfig;
use dropship_supplier::{affiliate_link, AffiliateSettings};
use sqlx::PgPool;

/// Prints a table of every sync record.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_records(pool: &PgPool) -> anyhow::Result<()> {
    let records = dropship_db::list_sync_records(pool).await?;
    if records.is_empty() {
        println!("no sync records; run `import` first");
        return Ok(());
    }

    let header = format!(
        "{:<20}{:<24}{:>10}{:>6}  {:<21}TITLE",
        "PRODUCT", "SKU", "PRICE", "QTY", "LAST SYNC"
    );
    println!("{header}");
    for record in &records {
        println!(
            "{:<20}{:<24}{:>10}{:>6}  {:<21}{}",
            record.supplier_product_id,
            record.sku,
            record.price,
            record.quantity,
            record.last_synced_at.format("%Y-%m-%d %H:%M:%S"),
            shorten(&record.title, 40)
        );
    }
    Ok(())
}

/// Prints one record including its raw snapshot.
///
/// # Errors
///
/// Returns an error if the record does not exist or the query fails.
pub(crate) async fn run_record_detail(pool: &PgPool, product_id: &str) -> anyhow::Result<()> {
    let record = dropship_db::get_sync_record(pool, product_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no sync record for product '{product_id}'"))?;

    println!("Product:  {}", record.supplier_product_id);
    println!("SKU:      {}", record.sku);
    println!("Title:    {}", record.title);
    println!(
        "Offer:    {}",
        record.marketplace_listing_id.as_deref().unwrap_or("\u{2014}")
    );
    println!("Price:    {}", record.price);
    println!("Quantity: {}", record.quantity);
    println!("Synced:   {}", record.last_synced_at.to_rfc3339());
    println!();
    let snapshot =
        serde_json::to_string_pretty(&record.raw_snapshot).context("rendering snapshot")?;
    println!("{snapshot}");
    Ok(())
}

pub(crate) fn run_affiliate_link(config: &AppConfig, product_id: &str) {
    let settings = AffiliateSettings::from_app_config(config);
    println!("{}", affiliate_link(product_id, &settings).link);
}

pub(crate) fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
