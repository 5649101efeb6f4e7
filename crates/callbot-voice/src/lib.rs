//! callbot-voice: answers phone calls through TwiML webhooks
//!
//! [`twiml`] builds the documents, [`flow`] decides what goes in them and
//! [`webhook`] exposes the flow over HTTP.

pub mod error;
pub mod flow;
pub mod twiml;
pub mod webhook;

pub use error::{Result, VoiceError};
pub use flow::{CallFlowController, CallScript, IncomingCall, SpeechTurn};
pub use twiml::{Gather, Say, VoiceResponse};
pub use webhook::router;
