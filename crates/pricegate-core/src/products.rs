use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product fetched from the storefront for a single catalog request,
/// carrying the fields pricing resolution and rendering need.
///
/// Products are transient: fetched fresh per request, priced, rendered,
/// and discarded. Nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Numeric Shopify product ID, extracted from the GraphQL `gid://` URI
    /// and stored as a string to avoid precision loss.
    pub id: String,
    pub title: String,
    /// Image URLs in storefront order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Numeric collection IDs this product belongs to. Pricing rules scoped
    /// to collections match against this list.
    #[serde(default)]
    pub collections: Vec<String>,
    /// List price as returned by the storefront, rounded half-up to 2dp at
    /// the fetch boundary.
    pub original_price: Decimal,
    /// Unit-measurement quantity (e.g. `0.75` for a 750ml bottle priced
    /// per litre). Zero when the storefront has no unit measurement
    /// configured; per-unit derivation rejects that case explicitly.
    pub measurement_value: Decimal,
    /// Unit for `measurement_value` (e.g. `"L"`, `"KG"`).
    pub measurement_unit: String,
    /// Resolved discounted price. Absent means "no discount applied — use
    /// `original_price`". Set only by the pricing resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_price: Option<Decimal>,
    /// Human-readable percentage that produced `special_price`, with
    /// trailing zeros stripped (`"10"`, `"12.5"`). Only set when a
    /// percentage tier fired; special-price tiers leave it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_factor: Option<String>,
}

impl Product {
    /// Returns `true` once the pricing resolver has applied a discount.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.special_price.is_some()
    }

    /// The price a buyer actually pays: the resolved special price when one
    /// exists, the list price otherwise.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.special_price.unwrap_or(self.original_price)
    }
}
