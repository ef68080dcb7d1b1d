//! Order hand-off seam.
//!
//! Accepted orders are passed to an [`OrderNotifier`]; the shipped
//! implementation writes a structured log line for the fulfilment team's
//! log pipeline to pick up. Delivery channels (email, webhooks) plug in
//! behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An order accepted by the API, as handed to the notifier and echoed back
/// to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub product_id: String,
    pub product_title: String,
    pub quantity: i64,
    pub username: String,
    pub accepted_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, order: &OrderReceipt) -> anyhow::Result<()>;
}

/// Notifier that records the order in the application log.
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn notify(&self, order: &OrderReceipt) -> anyhow::Result<()> {
        tracing::info!(
            product_id = %order.product_id,
            product_title = %order.product_title,
            quantity = order.quantity,
            user = %order.username,
            "order accepted"
        );
        Ok(())
    }
}
