//! Read-only views: summary numbers and the call log

use axum::{Json, extract::State};
use callbot_core::{CallRecord, Stats, TranscriptStore};
use tracing::debug;

use crate::error::Result;
use crate::server::AppState;

pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>> {
    let stats = state.store.stats()?;
    debug!("Stats: {:?}", stats);
    Ok(Json(stats))
}

pub async fn list_calls(State(state): State<AppState>) -> Result<Json<Vec<CallRecord>>> {
    Ok(Json(state.store.list_calls().await?))
}
