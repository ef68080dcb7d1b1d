pub mod error;
pub mod money;
pub mod resolver;

pub use error::PricingError;
pub use money::{format_discount, per_measurement_price, round_money};
pub use resolver::apply_pricing_rules;
