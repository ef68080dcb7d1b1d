use axum::{
    extract::{Path, State},
    Extension, Json,
};

use pricegate_shopify::{StockLevel, StorefrontError};

use crate::middleware::RequestId;

use super::{map_storefront_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Proxies the live stock check for one product. Queried on demand rather
/// than cached so quantities are current at the moment they are shown.
pub(super) async fn get_stock(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
) -> Result<Json<ApiResponse<StockLevel>>, ApiError> {
    match state.storefront.check_stock(&product_id).await {
        Ok(level) => Ok(Json(ApiResponse {
            data: level,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(StorefrontError::MissingField {
            field: "product", ..
        }) => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("product {product_id} not found"),
        )),
        Err(e) => Err(map_storefront_error(req_id.0, &e)),
    }
}
