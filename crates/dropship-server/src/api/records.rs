use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use dropship_core::SyncRecord;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

/// A sync record without its raw snapshot.
#[derive(Debug, Serialize)]
pub(super) struct RecordItem {
    supplier_product_id: String,
    sku: String,
    title: String,
    marketplace_listing_id: Option<String>,
    price: Decimal,
    quantity: i32,
    last_synced_at: DateTime<Utc>,
}

impl From<SyncRecord> for RecordItem {
    fn from(record: SyncRecord) -> Self {
        Self {
            supplier_product_id: record.supplier_product_id,
            sku: record.sku,
            title: record.title,
            marketplace_listing_id: record.marketplace_listing_id,
            price: record.price,
            quantity: record.quantity,
            last_synced_at: record.last_synced_at,
        }
    }
}

pub(super) async fn list_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<RecordItem>>>, ApiError> {
    let records = dropship_db::list_sync_records(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = records.into_iter().map(RecordItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_record(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<SyncRecord>>, ApiError> {
    let record = dropship_db::get_sync_record(&state.pool, &product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no sync record for product '{product_id}'"),
            )
        })?;

    Ok(Json(ApiResponse::new(record, req_id.0)))
}
