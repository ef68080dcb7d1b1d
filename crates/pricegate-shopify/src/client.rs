//! HTTP client for the Shopify Storefront GraphQL API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;

use pricegate_core::Product;

use crate::convert::product_from_node;
use crate::error::StorefrontError;
use crate::query::{products_query, stock_query, PageRequest};
use crate::retry::retry_with_backoff;
use crate::types::{GraphQlResponse, PageInfo, ProductsData, StockData, StockLevel};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Client for the Storefront GraphQL endpoint.
///
/// Handles rate limiting (429) and non-2xx responses as typed errors, and
/// retries transient failures with exponential backoff. The resolver treats
/// this as a black box: it hands back core [`Product`]s plus the page
/// cursors needed to drive pagination from the HTTP layer.
#[derive(Debug)]
pub struct StorefrontClient {
    client: Client,
    endpoint: String,
    /// Number of additional attempts after the first failure for
    /// retriable errors. Zero disables retries.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
}

impl StorefrontClient {
    /// Creates a client POSTing to `endpoint` with the given Storefront
    /// access token, timeout, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::InvalidAccessToken`] if the token cannot
    /// be carried in an HTTP header, or [`StorefrontError::Http`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        endpoint: String,
        access_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, StorefrontError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let value = reqwest::header::HeaderValue::from_str(access_token)
            .map_err(|_| StorefrontError::InvalidAccessToken)?;
        headers.insert(ACCESS_TOKEN_HEADER, value);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page of active products, optionally filtered to a title
    /// prefix, converted to core [`Product`]s.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::RateLimited`] — 429 after all retries.
    /// - [`StorefrontError::UnexpectedStatus`] — other non-2xx status.
    /// - [`StorefrontError::GraphQl`] — top-level GraphQL errors.
    /// - [`StorefrontError::Deserialize`] — body is not the expected shape.
    /// - [`StorefrontError::MissingField`] / [`StorefrontError::InvalidDecimal`] /
    ///   [`StorefrontError::MalformedGid`] — a node cannot be converted.
    pub async fn fetch_products_page(
        &self,
        search: Option<&str>,
        page: &PageRequest,
        page_size: u32,
    ) -> Result<(Vec<Product>, PageInfo), StorefrontError> {
        let query = products_query(search, page, page_size);
        let data: ProductsData = self.execute(&query, "products page").await?;

        let page_info = data.products.page_info.unwrap_or_default();
        let products = data
            .products
            .edges
            .into_iter()
            .map(|edge| product_from_node(edge.node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, page_info))
    }

    /// Fetches the live stock level and unit label for one product.
    ///
    /// # Errors
    ///
    /// Same transport errors as [`Self::fetch_products_page`], plus
    /// [`StorefrontError::MissingField`] when the product or its variants
    /// are absent from the response.
    pub async fn check_stock(&self, product_id: &str) -> Result<StockLevel, StorefrontError> {
        let query = stock_query(product_id);
        let data: StockData = self.execute(&query, "stock level").await?;

        let product = data.product.ok_or_else(|| StorefrontError::MissingField {
            field: "product",
            context: format!("stock level for {product_id}"),
        })?;
        let variant = product
            .variants
            .edges
            .into_iter()
            .next()
            .map(|edge| edge.node)
            .ok_or_else(|| StorefrontError::MissingField {
                field: "variants",
                context: format!("stock level for {product_id}"),
            })?;

        Ok(StockLevel {
            stock: variant.quantity_available.unwrap_or(0),
            unit: product.metafield.map(|m| m.value).unwrap_or_default(),
        })
    }

    /// POSTs a GraphQL query with retry, unwraps the envelope, and returns
    /// the `data` payload.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        context: &str,
    ) -> Result<T, StorefrontError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        retry_with_backoff(max_retries, backoff_base_secs, || {
            let query = query.to_owned();
            let context = context.to_owned();
            async move {
                let response = self
                    .client
                    .post(&self.endpoint)
                    .json(&json!({ "query": query }))
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(StorefrontError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    return Err(StorefrontError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: self.endpoint.clone(),
                    });
                }

                let body = response.text().await?;
                let envelope: GraphQlResponse<T> =
                    serde_json::from_str(&body).map_err(|e| StorefrontError::Deserialize {
                        context: context.clone(),
                        source: e,
                    })?;

                if !envelope.errors.is_empty() {
                    return Err(StorefrontError::GraphQl {
                        messages: envelope.errors.into_iter().map(|e| e.message).collect(),
                    });
                }

                envelope.data.ok_or(StorefrontError::MissingField {
                    field: "data",
                    context,
                })
            }
        })
        .await
    }
}
