//! Persistence for calls and the admin catalog
//!
//! The call flow only sees [`TranscriptStore`]; the admin API works with
//! [`SqliteStore`] directly.

mod sqlite;
mod types;

use async_trait::async_trait;

use crate::Result;

pub use sqlite::SqliteStore;
pub use types::*;

/// Sink for per-call records
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Insert a fresh `answered` record with zero duration. Calling this
    /// twice for one call identifier creates two rows.
    async fn create_call(&self, call_sid: &str, caller_number: &str) -> Result<CallRecord>;

    /// Attach the caller's utterance and the generated reply to records of
    /// `call_sid` that have none yet. Returns `false` when nothing was
    /// updated: no matching record, or the first turn is already stored.
    async fn attach_transcript(
        &self,
        call_sid: &str,
        transcript: &str,
        ai_response: &str,
    ) -> Result<bool>;

    /// All calls, newest first
    async fn list_calls(&self) -> Result<Vec<CallRecord>>;
}
