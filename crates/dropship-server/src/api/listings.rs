use axum::{extract::State, Extension, Json};
use dropship_sync::{BatchReport, PublishedListing};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_sync_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ImportBody {
    pub product_id: String,
    /// Falls back to the configured default markup.
    pub markup_percent: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SyncBody {
    /// Every known product when empty.
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub stock_only: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct SyncItem {
    pub product_id: String,
    /// `ok`, or the error kind.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub items: Vec<SyncItem>,
}

pub(super) async fn import_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImportBody>,
) -> Result<Json<ApiResponse<PublishedListing>>, ApiError> {
    let product_id = body.product_id.trim();
    if product_id.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "product_id must not be empty",
        ));
    }

    let listing = state
        .publisher
        .run_import(product_id, body.markup_percent)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(listing, req_id.0)))
}

pub(super) async fn sync_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SyncBody>,
) -> Result<Json<ApiResponse<SyncSummary>>, ApiError> {
    let product_ids = if body.product_ids.is_empty() {
        state
            .publisher
            .known_product_ids()
            .await
            .map_err(|e| map_sync_error(req_id.0.clone(), &e))?
    } else {
        body.product_ids
    };

    let cancel = state.shutdown.child_token();
    let items = if body.stock_only {
        let report = state.publisher.run_stock_sync(&product_ids, &cancel).await;
        sync_items(report, |quantity, item| item.quantity = Some(quantity))
    } else {
        let report = state.publisher.run_sync(&product_ids, &cancel).await;
        sync_items(report, |listing, item| {
            item.offer_id = Some(listing.offer_id);
            item.quantity = Some(listing.available_quantity);
        })
    };

    Ok(Json(ApiResponse::new(summarize(items), req_id.0)))
}

pub(super) fn sync_items<T>(
    report: BatchReport<T>,
    fill: impl Fn(T, &mut SyncItem),
) -> Vec<SyncItem> {
    report
        .into_iter()
        .map(|(product_id, outcome)| {
            let mut item = SyncItem {
                product_id,
                status: "ok",
                offer_id: None,
                quantity: None,
                error: None,
            };
            match outcome {
                Ok(value) => fill(value, &mut item),
                Err(err) => {
                    item.status = err.kind();
                    item.error = Some(err.to_string());
                }
            }
            item
        })
        .collect()
}

pub(super) fn summarize(items: Vec<SyncItem>) -> SyncSummary {
    let succeeded = items.iter().filter(|i| i.status == "ok").count();
    let cancelled = items.iter().filter(|i| i.status == "cancelled").count();
    SyncSummary {
        total: items.len(),
        succeeded,
        failed: items.len() - succeeded - cancelled,
        cancelled,
        items,
    }
}
