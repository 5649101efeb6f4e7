//! callbot-api: admin REST API and HTTP server for the call bot
//!
//! Serves the dashboard's JSON endpoints, mounts the voice webhooks and hosts
//! the built dashboard bundle.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, app, start_server};
