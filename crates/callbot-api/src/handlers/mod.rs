//! HTTP API handlers
//!
//! Request handlers for the admin dashboard.

pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod payments;

use axum::extract::FromRequest;
use serde::Serialize;

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API's error shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `{"success": true}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
