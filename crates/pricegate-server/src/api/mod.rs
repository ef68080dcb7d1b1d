mod catalog;
mod orders;
mod stock;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use pricegate_core::RuleStore;
use pricegate_shopify::{StorefrontClient, StorefrontError};

use crate::middleware::{request_id, RequestId};
use crate::notify::OrderNotifier;

/// Header set by the upstream auth proxy identifying the requesting user.
pub const USER_HEADER: &str = "x-pricegate-user";

#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleStore>,
    pub storefront: Arc<StorefrontClient>,
    pub notifier: Arc<dyn OrderNotifier>,
    /// Products per catalog page, fixed by configuration.
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    rule_store: &'static str,
    rule_users: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Reads the requesting user from the auth proxy's header. The proxy is
/// the trust boundary; a missing header means the request never went
/// through it.
pub(super) fn require_user(headers: &HeaderMap, request_id: &str) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "unauthorized",
                format!("missing {USER_HEADER} header"),
            )
        })
}

pub(super) fn map_storefront_error(request_id: String, error: &StorefrontError) -> ApiError {
    match error {
        StorefrontError::RateLimited { retry_after_secs } => {
            tracing::warn!(retry_after_secs, "storefront rate limit hit");
            ApiError::new(
                request_id,
                "rate_limited",
                "storefront rate limit exceeded, retry later",
            )
        }
        other => {
            tracing::error!(error = %other, "storefront request failed");
            ApiError::new(request_id, "bad_gateway", "storefront request failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(USER_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/catalog", get(catalog::get_catalog))
        .route("/api/v1/stock/{product_id}", get(stock::get_stock))
        .route("/api/v1/orders/{product_id}", post(orders::submit_order))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                rule_store: "ok",
                rule_users: state.rules.user_count(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::notify::{LogNotifier, OrderReceipt};

    const RULES_YAML: &str = r"
users:
  - username: alice
    base_discount: '10'
  - username: bob
    rules:
      - product_ids: ['42']
        special_price: '7.50'
";

    /// Notifier that captures receipts for assertions.
    struct RecordingNotifier {
        orders: Mutex<Vec<OrderReceipt>>,
    }

    #[async_trait::async_trait]
    impl OrderNotifier for RecordingNotifier {
        async fn notify(&self, order: &OrderReceipt) -> anyhow::Result<()> {
            self.orders
                .lock()
                .expect("notifier lock")
                .push(order.clone());
            Ok(())
        }
    }

    fn test_state(endpoint: String, notifier: Arc<dyn OrderNotifier>) -> AppState {
        let rules = RuleStore::from_yaml_str(RULES_YAML).expect("test rules");
        let storefront =
            StorefrontClient::new(endpoint, "test-token", 5, 0, 0).expect("test client");
        AppState {
            rules: Arc::new(rules),
            storefront: Arc::new(storefront),
            notifier,
            page_size: 50,
        }
    }

    fn test_app(endpoint: String) -> Router {
        build_app(test_state(endpoint, Arc::new(LogNotifier)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    fn one_product_body(id: i64, price: &str) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "products": {
                    "edges": [{
                        "node": {
                            "id": format!("gid://shopify/Product/{id}"),
                            "title": "Olive Oil",
                            "images": { "edges": [] },
                            "variants": {
                                "edges": [{
                                    "node": {
                                        "price": { "amount": price },
                                        "unitPriceMeasurement": {
                                            "quantityValue": 0.5,
                                            "quantityUnit": "L"
                                        }
                                    }
                                }]
                            },
                            "collections": { "edges": [] }
                        }
                    }],
                    "pageInfo": {
                        "hasNextPage": false,
                        "hasPreviousPage": false,
                        "startCursor": null,
                        "endCursor": "end"
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn health_reports_rule_store() {
        let app = test_app("http://localhost:1/graphql".to_string());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["data"]["rule_users"].as_u64(), Some(2));
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn responses_echo_the_request_id_header() {
        let app = test_app("http://localhost:1/graphql".to_string());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-echo-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-echo-1")
        );
        let json = body_json(response).await;
        assert_eq!(json["meta"]["request_id"].as_str(), Some("req-echo-1"));
    }

    #[tokio::test]
    async fn catalog_without_user_header_is_unauthorized() {
        let app = test_app("http://localhost:1/graphql".to_string());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("unauthorized"));
    }

    #[tokio::test]
    async fn catalog_with_both_cursors_is_validation_error() {
        let app = test_app("http://localhost:1/graphql".to_string());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog?after=a&before=b")
                    .header(USER_HEADER, "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn catalog_applies_base_discount_and_per_unit_prices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_product_body(42, "20.00")))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let item = &json["data"]["products"][0];
        // alice: base_discount 10% of 20.00 -> 18.00
        assert_eq!(item["special_price"].as_str(), Some("18.00"));
        assert_eq!(item["discount_factor"].as_str(), Some("10"));
        // 0.5 L measurement: 20.00 / 0.5 and 18.00 / 0.5
        assert_eq!(
            item["original_price_per_measurement"].as_str(),
            Some("40.00")
        );
        assert_eq!(item["special_price_per_measurement"].as_str(), Some("36.00"));
        assert_eq!(json["data"]["page_info"]["end_cursor"].as_str(), Some("end"));
    }

    #[tokio::test]
    async fn catalog_product_special_rule_wins_for_its_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_product_body(42, "20.00")))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "bob")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let item = &json["data"]["products"][0];
        assert_eq!(item["special_price"].as_str(), Some("7.50"));
        // Special-price tiers carry no percentage factor.
        assert!(item["discount_factor"].is_null());
    }

    #[tokio::test]
    async fn catalog_omits_per_unit_prices_when_measurement_is_missing() {
        let server = MockServer::start().await;
        let mut body = one_product_body(42, "20.00");
        body["data"]["products"]["edges"][0]["node"]["variants"]["edges"][0]["node"]
            ["unitPriceMeasurement"] = serde_json::Value::Null;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let item = &json["data"]["products"][0];
        assert_eq!(item["special_price"].as_str(), Some("18.00"));
        assert!(item["original_price_per_measurement"].is_null());
        assert!(item["special_price_per_measurement"].is_null());
    }

    #[tokio::test]
    async fn catalog_omits_special_per_unit_price_when_derivation_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_product_body(42, "20.00")))
            .mount(&server)
            .await;

        // Decimal::MAX as an override price: dividing it by the 0.5 L
        // measurement overflows, while the original-price division is fine.
        let yaml = r"
users:
  - username: carol
    rules:
      - product_ids: ['42']
        special_price: '79228162514264337593543950335'
";
        let rules = RuleStore::from_yaml_str(yaml).expect("test rules");
        let storefront = StorefrontClient::new(
            format!("{}/graphql", server.uri()),
            "test-token",
            5,
            0,
            0,
        )
        .expect("test client");
        let app = build_app(AppState {
            rules: Arc::new(rules),
            storefront: Arc::new(storefront),
            notifier: Arc::new(LogNotifier),
            page_size: 50,
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "carol")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let item = &json["data"]["products"][0];
        assert!(item["special_price"].is_string());
        assert_eq!(
            item["original_price_per_measurement"].as_str(),
            Some("40.00")
        );
        assert!(item["special_price_per_measurement"].is_null());
    }

    #[tokio::test]
    async fn catalog_maps_upstream_failure_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("bad_gateway"));
    }

    #[tokio::test]
    async fn catalog_maps_upstream_rate_limit_to_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/catalog")
                    .header(USER_HEADER, "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("rate_limited"));
    }

    #[tokio::test]
    async fn stock_for_unknown_product_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "product": null } })),
            )
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stock/999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("not_found"));
    }

    #[tokio::test]
    async fn stock_proxies_quantity_and_unit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "product": {
                        "variants": { "edges": [{ "node": { "quantityAvailable": 12 } }] },
                        "metafield": { "value": "bottle" }
                    }
                }
            })))
            .mount(&server)
            .await;

        let app = test_app(format!("{}/graphql", server.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stock/42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["stock"].as_i64(), Some(12));
        assert_eq!(json["data"]["unit"].as_str(), Some("bottle"));
    }

    #[tokio::test]
    async fn order_with_zero_quantity_is_rejected() {
        let app = test_app("http://localhost:1/graphql".to_string());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/orders/42")
                    .header(USER_HEADER, "alice")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"quantity": 0, "product_title": "Olive Oil"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn accepted_order_reaches_the_notifier() {
        let notifier = Arc::new(RecordingNotifier {
            orders: Mutex::new(Vec::new()),
        });
        let app = build_app(test_state(
            "http://localhost:1/graphql".to_string(),
            Arc::clone(&notifier) as Arc<dyn OrderNotifier>,
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/orders/42")
                    .header(USER_HEADER, "bob")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"quantity": 3, "product_title": "Olive Oil"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["product_id"].as_str(), Some("42"));
        assert_eq!(json["data"]["quantity"].as_i64(), Some(3));
        assert_eq!(json["data"]["username"].as_str(), Some("bob"));

        let orders = notifier.orders.lock().expect("notifier lock");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].product_title, "Olive Oil");
    }
}
