//! Error types for callbot-payments

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentsError {
    #[error("Stripe secret key not set")]
    NotConfigured,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Stripe API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentsError>;
