//! Database operations for `sync_records`.

use chrono::{DateTime, Utc};
use dropship_core::SyncRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `sync_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRecordRow {
    pub supplier_product_id: String,
    pub sku: String,
    pub title: String,
    pub marketplace_listing_id: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub last_synced_at: DateTime<Utc>,
    pub raw_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SyncRecordRow> for SyncRecord {
    fn from(row: SyncRecordRow) -> Self {
        Self {
            supplier_product_id: row.supplier_product_id,
            sku: row.sku,
            title: row.title,
            marketplace_listing_id: row.marketplace_listing_id,
            price: row.price,
            quantity: row.quantity,
            last_synced_at: row.last_synced_at,
            raw_snapshot: row.raw_snapshot,
        }
    }
}

const SELECT_COLUMNS: &str = "supplier_product_id, sku, title, marketplace_listing_id, price, \
     quantity, last_synced_at, raw_snapshot, created_at, updated_at";

/// Inserts or replaces the record for `record.supplier_product_id`.
///
/// Conflicts on `supplier_product_id` overwrite every mutable column, so a
/// later sync always wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_sync_record(pool: &PgPool, record: &SyncRecord) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sync_records \
             (supplier_product_id, sku, title, marketplace_listing_id, price, quantity, \
              last_synced_at, raw_snapshot) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8::jsonb) \
         ON CONFLICT (supplier_product_id) DO UPDATE SET \
             sku                    = EXCLUDED.sku, \
             title                  = EXCLUDED.title, \
             marketplace_listing_id = EXCLUDED.marketplace_listing_id, \
             price                  = EXCLUDED.price, \
             quantity               = EXCLUDED.quantity, \
             last_synced_at         = EXCLUDED.last_synced_at, \
             raw_snapshot           = EXCLUDED.raw_snapshot, \
             updated_at             = NOW()",
    )
    .bind(&record.supplier_product_id)
    .bind(&record.sku)
    .bind(&record.title)
    .bind(&record.marketplace_listing_id)
    .bind(record.price)
    .bind(record.quantity)
    .bind(record.last_synced_at)
    .bind(&record.raw_snapshot)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the record for `supplier_product_id`, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_record(
    pool: &PgPool,
    supplier_product_id: &str,
) -> Result<Option<SyncRecord>, DbError> {
    let row = sqlx::query_as::<_, SyncRecordRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM sync_records WHERE supplier_product_id = $1"
    ))
    .bind(supplier_product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(SyncRecord::from))
}

/// Lists every record, ordered by `supplier_product_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_records(pool: &PgPool) -> Result<Vec<SyncRecord>, DbError> {
    let rows = sqlx::query_as::<_, SyncRecordRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM sync_records ORDER BY supplier_product_id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SyncRecord::from).collect())
}

/// Sets `quantity` and `last_synced_at` on an existing record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no record exists for
/// `supplier_product_id`, or [`DbError::Sqlx`] if the update fails.
pub async fn update_sync_quantity(
    pool: &PgPool,
    supplier_product_id: &str,
    quantity: i32,
    synced_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_records \
         SET quantity = $2, last_synced_at = $3, updated_at = NOW() \
         WHERE supplier_product_id = $1",
    )
    .bind(supplier_product_id)
    .bind(quantity)
    .bind(synced_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
