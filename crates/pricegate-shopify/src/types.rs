//! Storefront GraphQL response types.
//!
//! ## Observed behavior of the Storefront API (vs. the Admin API)
//!
//! The Admin API supports SKU query filters but carries no unit-price
//! measurement; the Storefront API is the reverse. This proxy needs the
//! `unitPriceMeasurement` block for per-unit pricing, so it talks to the
//! Storefront API and filters on title prefix instead of SKU.
//!
//! ### IDs
//! Nodes carry opaque `gid://shopify/Product/123456` URIs. Only the
//! trailing numeric part is stable across APIs, so conversion extracts it
//! (see `convert::extract_numeric_id`).
//!
//! ### `unitPriceMeasurement`
//! May be `null`, and `quantityValue` is `0` when the merchant configured
//! no measurement. Conversion passes the zero through; per-unit derivation
//! downstream rejects it explicitly rather than dividing by it.
//!
//! ### Prices
//! `price.amount` is a decimal string (e.g. `"12.99"`, sometimes `"12.0"`).
//! Parsed into `Decimal` at conversion and rounded half-up to 2dp.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Generic GraphQL envelope: either `data`, or a top-level `errors` array.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// A GraphQL connection: edges plus page-level cursors.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// Cursor block from a product connection, passed through to callers so
/// they can drive pagination themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// `data` payload of the products query.
#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductNode {
    /// Opaque gid URI, e.g. `gid://shopify/Product/8039624343786`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub images: Option<Connection<ImageNode>>,
    pub variants: Connection<VariantNode>,
    #[serde(default)]
    pub collections: Option<Connection<CollectionNode>>,
}

#[derive(Debug, Deserialize)]
pub struct ImageNode {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CollectionNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct VariantNode {
    pub price: PriceNode,
    #[serde(rename = "unitPriceMeasurement", default)]
    pub unit_price_measurement: Option<UnitPriceMeasurement>,
}

#[derive(Debug, Deserialize)]
pub struct PriceNode {
    /// Decimal string, e.g. `"12.99"`.
    pub amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPriceMeasurement {
    /// Numeric in the wire format; zero when no measurement is configured.
    #[serde(default)]
    pub quantity_value: Decimal,
    #[serde(default)]
    pub quantity_unit: Option<String>,
}

/// `data` payload of the stock query.
#[derive(Debug, Deserialize)]
pub struct StockData {
    pub product: Option<StockProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct StockProductNode {
    pub variants: Connection<StockVariantNode>,
    #[serde(default)]
    pub metafield: Option<MetafieldNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockVariantNode {
    #[serde(default)]
    pub quantity_available: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MetafieldNode {
    pub value: String,
}

/// Live stock for one product, from the dedicated stock query.
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub stock: i64,
    /// Unit label from the product's `productDetails.unit` metafield;
    /// empty when the metafield is not set.
    pub unit: String,
}
