use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::middleware::RequestId;
use crate::notify::OrderReceipt;

use super::{require_user, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct OrderRequest {
    quantity: i64,
    product_title: String,
}

/// Accepts an order and hands it to the notifier. The caller gets a 202
/// receipt once the hand-off succeeds; fulfilment happens downstream.
pub(super) async fn submit_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderReceipt>>), ApiError> {
    let username = require_user(&headers, &req_id.0)?;

    if body.quantity < 1 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "quantity must be at least 1",
        ));
    }
    if body.product_title.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "product_title must not be empty",
        ));
    }

    let receipt = OrderReceipt {
        product_id,
        product_title: body.product_title,
        quantity: body.quantity,
        username,
        accepted_at: Utc::now(),
    };

    state.notifier.notify(&receipt).await.map_err(|error| {
        tracing::error!(%error, "order notification failed");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to record order")
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: receipt,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
