//! Payment intent creation

use axum::{Json, extract::State};
use callbot_payments::PaymentIntentRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiJson;
use crate::error::{ApiError, Result};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    /// The dashboard sends either a number or a string
    #[serde(default)]
    pub order_id: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: String,
}

pub async fn create_payment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>> {
    let gateway = state.payments.as_ref().ok_or(ApiError::PaymentsUnavailable)?;

    let order_id = req.order_id.and_then(|id| match id {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    });

    let intent = gateway
        .create_intent(&PaymentIntentRequest {
            amount: req.amount,
            currency: req.currency,
            order_id,
        })
        .await?;

    Ok(Json(CreatePaymentResponse {
        client_secret: intent.client_secret,
    }))
}
