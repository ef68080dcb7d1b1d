use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Per-unit price derivation needs a positive measurement quantity.
    /// Zero would divide by zero; the storefront reports zero when no unit
    /// measurement is configured for the product.
    #[error("invalid measurement value {measurement_value} for product {product_id}")]
    InvalidMeasurement {
        product_id: String,
        measurement_value: Decimal,
    },

    /// Decimal arithmetic overflowed. Only reachable with pathological rule
    /// values; resolution for the affected product is abandoned, the rest of
    /// the batch is unaffected.
    #[error("monetary arithmetic overflow while pricing product {product_id}")]
    Overflow { product_id: String },
}
