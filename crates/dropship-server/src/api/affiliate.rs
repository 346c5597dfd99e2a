use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dropship_supplier::AffiliateLink;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AffiliateQuery {
    pub product_id: String,
}

pub(super) async fn affiliate_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AffiliateQuery>,
) -> Result<Json<ApiResponse<AffiliateLink>>, ApiError> {
    let product_id = query.product_id.trim();
    if product_id.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "product_id must not be empty",
        ));
    }

    let link = dropship_supplier::affiliate_link(product_id, &state.affiliate);
    Ok(Json(ApiResponse::new(link, req_id.0)))
}
