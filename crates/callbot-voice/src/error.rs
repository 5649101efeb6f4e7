//! Error types for callbot-voice

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Failed to write TwiML: {0}")]
    Markup(String),

    #[error("TwiML is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VoiceError>;
