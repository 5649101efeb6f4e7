//! Stripe REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::{PaymentsError, Result};
use crate::models::{CreateIntentForm, PaymentIntent, PaymentIntentRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Creates payment intents with a hosted payments provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent>;
}

/// Stripe API client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let secret_key = secret_key.into();
        if secret_key.trim().is_empty() {
            return Err(PaymentsError::NotConfigured);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from config; `None` when no secret key is configured
    pub fn from_config(config: &callbot_core::PaymentsConfig) -> Result<Option<Self>> {
        match &config.secret_key {
            Some(key) => Self::new(key.clone(), config.base_url.clone()).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent> {
        let form = CreateIntentForm {
            amount: request.amount_minor()?,
            currency: request.currency(),
            order_id: request.order_id.as_deref(),
        };

        let url = format!("{}/v1/payment_intents", self.base_url);
        info!("Creating payment intent: {} {}", form.amount, form.currency);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Stripe API error: {} - {}", status, body);
            return Err(PaymentsError::Api(format!("{}: {}", status, body)));
        }

        let intent: PaymentIntent = serde_json::from_str(&body)?;
        info!("Created payment intent {}", intent.id);
        Ok(intent)
    }
}
