//! Payment intent request and response shapes

use serde::{Deserialize, Serialize};

use crate::error::{PaymentsError, Result};

pub const DEFAULT_CURRENCY: &str = "usd";

/// A payment intent to create. `amount` is in major units (dollars).
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    pub amount: f64,
    pub currency: Option<String>,
    pub order_id: Option<String>,
}

impl PaymentIntentRequest {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            currency: None,
            order_id: None,
        }
    }

    pub fn currency(&self) -> &str {
        self.currency
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    /// Amount in minor units (cents)
    pub fn amount_minor(&self) -> Result<i64> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(PaymentsError::InvalidAmount(format!(
                "amount must be a positive number, got {}",
                self.amount
            )));
        }
        Ok((self.amount * 100.0).round() as i64)
    }
}

/// Form body sent to `/v1/payment_intents`
#[derive(Debug, Serialize)]
pub(crate) struct CreateIntentForm<'a> {
    pub amount: i64,
    pub currency: &'a str,
    #[serde(rename = "metadata[orderId]", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<&'a str>,
}

/// A created payment intent
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    /// Minor units
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}
