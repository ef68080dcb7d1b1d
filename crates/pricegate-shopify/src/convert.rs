//! Conversion from Storefront GraphQL nodes to the core [`Product`] model.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use pricegate_core::Product;

use crate::error::StorefrontError;
use crate::types::ProductNode;

/// Extracts the trailing numeric ID from a `gid://` URI.
///
/// The Storefront and Admin APIs render the same product under different
/// gid prefixes; only the trailing digits are stable, so that is what the
/// rest of the system keys on.
#[must_use]
pub fn extract_numeric_id(gid: &str) -> Option<&str> {
    let digits_start = gid
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |idx| idx + 1);
    let digits = &gid[digits_start..];
    (!digits.is_empty()).then_some(digits)
}

/// Converts one product node into a core [`Product`].
///
/// The first variant drives pricing (catalog queries request exactly one).
/// A missing `unitPriceMeasurement` block degrades to a zero quantity and
/// empty unit; per-unit derivation downstream rejects the zero rather than
/// dividing by it.
///
/// # Errors
///
/// - [`StorefrontError::MalformedGid`] — a product or collection gid has no
///   trailing numeric ID.
/// - [`StorefrontError::MissingField`] — the node has no variants.
/// - [`StorefrontError::InvalidDecimal`] — the price amount does not parse.
pub fn product_from_node(node: ProductNode) -> Result<Product, StorefrontError> {
    let id = extract_numeric_id(&node.id)
        .ok_or_else(|| StorefrontError::MalformedGid(node.id.clone()))?
        .to_string();

    let variant = node
        .variants
        .edges
        .into_iter()
        .next()
        .map(|edge| edge.node)
        .ok_or_else(|| StorefrontError::MissingField {
            field: "variants",
            context: format!("product {id}"),
        })?;

    let original_price = parse_price(&id, "price.amount", &variant.price.amount)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let (measurement_value, measurement_unit) = match variant.unit_price_measurement {
        Some(m) => (m.quantity_value, m.quantity_unit.unwrap_or_default()),
        None => (Decimal::ZERO, String::new()),
    };

    let images = node
        .images
        .map(|connection| {
            connection
                .edges
                .into_iter()
                .map(|edge| edge.node.url)
                .collect()
        })
        .unwrap_or_default();

    let collections = node
        .collections
        .map(|connection| {
            connection
                .edges
                .into_iter()
                .map(|edge| {
                    extract_numeric_id(&edge.node.id)
                        .map(str::to_string)
                        .ok_or_else(|| StorefrontError::MalformedGid(edge.node.id.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(Product {
        id,
        title: node.title,
        images,
        collections,
        original_price,
        measurement_value,
        measurement_unit,
        special_price: None,
        discount_factor: None,
    })
}

fn parse_price(
    product_id: &str,
    field: &'static str,
    raw: &str,
) -> Result<Decimal, StorefrontError> {
    Decimal::from_str(raw).map_err(|_| StorefrontError::InvalidDecimal {
        product_id: product_id.to_string(),
        field,
        raw: raw.to_string(),
    })
}
