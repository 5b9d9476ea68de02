//! Outbound chat delivery.
//!
//! Pipelines only see `DeliveryChannel`; length limits and markup fallback are
//! the channel's problem.

use async_trait::async_trait;

pub mod telegram;

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Sends `text`. Returns false instead of erroring when the channel rejects it.
    async fn deliver(&self, text: &str) -> bool;
}
