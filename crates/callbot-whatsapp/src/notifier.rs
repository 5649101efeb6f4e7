//! Fire-and-forget customer notifications

use async_trait::async_trait;
use tracing::{error, warn};

use crate::callmebot::CallMeBotClient;
use crate::error::WhatsAppError;

/// Sends a text message to a phone number
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the gateway's response, or `None` if the message could not be
    /// sent. Never fails.
    async fn notify(&self, phone: &str, message: &str) -> Option<String>;
}

#[async_trait]
impl Notifier for CallMeBotClient {
    async fn notify(&self, phone: &str, message: &str) -> Option<String> {
        match self.send_message(phone, message).await {
            Ok(body) => Some(body),
            Err(WhatsAppError::ApiKeyNotSet) => {
                warn!("WhatsApp notifications disabled, not sending to {}", phone);
                None
            }
            Err(e) => {
                error!("WhatsApp error: {}", e);
                None
            }
        }
    }
}
