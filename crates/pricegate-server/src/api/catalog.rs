use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pricegate_core::Product;
use pricegate_pricing::{apply_pricing_rules, per_measurement_price};
use pricegate_shopify::{PageInfo, PageRequest};

use crate::middleware::RequestId;

use super::{map_storefront_error, require_user, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CatalogQuery {
    pub search: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// A catalog product with per-measurement prices attached (e.g. the
/// per-litre price shown next to a bottle price). Per-measurement fields
/// are omitted when the product carries no usable measurement.
#[derive(Debug, Serialize)]
pub(super) struct CatalogItem {
    #[serde(flatten)]
    product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_price_per_measurement: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    special_price_per_measurement: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct CatalogData {
    products: Vec<CatalogItem>,
    page_info: CatalogPageInfo,
}

/// Connection cursors in the API's snake_case convention.
#[derive(Debug, Serialize)]
pub(super) struct CatalogPageInfo {
    has_next_page: bool,
    has_previous_page: bool,
    start_cursor: Option<String>,
    end_cursor: Option<String>,
}

impl From<PageInfo> for CatalogPageInfo {
    fn from(info: PageInfo) -> Self {
        Self {
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            start_cursor: info.start_cursor,
            end_cursor: info.end_cursor,
        }
    }
}

pub(super) async fn get_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogData>>, ApiError> {
    let username = require_user(&headers, &req_id.0)?;
    let page = page_request(&query, &req_id.0)?;

    let (products, page_info) = state
        .storefront
        .fetch_products_page(query.search.as_deref(), &page, state.page_size)
        .await
        .map_err(|e| map_storefront_error(req_id.0.clone(), &e))?;

    let priced = apply_pricing_rules(&state.rules, &username, products);
    let items = priced.into_iter().map(with_per_measurement_prices).collect();

    Ok(Json(ApiResponse {
        data: CatalogData {
            products: items,
            page_info: page_info.into(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn page_request(query: &CatalogQuery, request_id: &str) -> Result<PageRequest, ApiError> {
    match (&query.after, &query.before) {
        (Some(_), Some(_)) => Err(ApiError::new(
            request_id,
            "validation_error",
            "after and before cursors are mutually exclusive",
        )),
        (Some(after), None) => Ok(PageRequest::After(after.clone())),
        (None, Some(before)) => Ok(PageRequest::Before(before.clone())),
        (None, None) => Ok(PageRequest::First),
    }
}

/// Derives per-measurement prices for one priced product. A product with
/// no usable measurement (zero quantity) gets its per-measurement fields
/// omitted with a warn; the rest of the page is unaffected.
fn with_per_measurement_prices(product: Product) -> CatalogItem {
    let per_unit =
        |price: Decimal| per_measurement_price(&product.id, price, product.measurement_value);

    let (original_ppm, special_ppm) = match per_unit(product.original_price) {
        Ok(original) => {
            let special = product.special_price.and_then(|sp| match per_unit(sp) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(
                        product_id = %product.id,
                        %error,
                        "special per-measurement price unavailable"
                    );
                    None
                }
            });
            (Some(original), special)
        }
        Err(error) => {
            tracing::warn!(product_id = %product.id, %error, "per-measurement price unavailable");
            (None, None)
        }
    };

    CatalogItem {
        product,
        original_price_per_measurement: original_ppm,
        special_price_per_measurement: special_ppm,
    }
}
