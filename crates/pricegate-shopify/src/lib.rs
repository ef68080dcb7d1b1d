pub mod client;
pub mod convert;
pub mod error;
pub mod query;
mod retry;
pub mod types;

pub use client::StorefrontClient;
pub use error::StorefrontError;
pub use query::PageRequest;
pub use types::{PageInfo, StockLevel};
