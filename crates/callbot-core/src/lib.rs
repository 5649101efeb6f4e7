//! callbot-core: shared building blocks for the call bot
//!
//! Configuration, the error type, the persisted records, the SQLite-backed
//! transcript store and the language-model reply generator.

pub mod config;
pub mod error;
pub mod llm;
pub mod reply;
pub mod store;

pub use config::{
    Config, DatabaseConfig, LlmConfig, LlmProvider, PaymentsConfig, ServerConfig, VoiceConfig,
    WhatsAppConfig,
};
pub use error::{Error, Result};
pub use llm::LlmClient;
pub use reply::{APOLOGY, AssistantReplier, ReplyGenerator};
pub use store::{
    CallRecord, CallStatus, Faq, FaqInput, FaqPatch, Order, OrderItem, OrderStatus, NewOrder,
    Product, ProductInput, ProductPatch, SqliteStore, Stats, TranscriptStore,
};
