// src/publish/mod.rs
pub mod telegram;

use crate::error::PostError;

/// Positive acknowledgment from the delivery channel.
#[derive(Debug, Clone)]
pub struct Ack {
    pub message_id: i64,
}

/// Delivery capability: ship (image, caption) to the channel. The caption
/// is expected to already respect the channel's markup dialect and length
/// limit; the sender does not re-validate it.
#[async_trait::async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, image: &[u8], caption: &str) -> Result<Ack, PostError>;
}
