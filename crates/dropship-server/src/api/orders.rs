use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dropship_marketplace::Order;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_sync_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct OrderQuery {
    pub limit: Option<u32>,
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, ApiError> {
    let orders = state
        .publisher
        .recent_orders(normalize_limit(query.limit))
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(orders, req_id.0)))
}
