//! callbot-whatsapp: WhatsApp notifications via the CallMeBot gateway

pub mod callmebot;
pub mod error;
pub mod notifier;

pub use callmebot::CallMeBotClient;
pub use error::{Result, WhatsAppError};
pub use notifier::Notifier;
