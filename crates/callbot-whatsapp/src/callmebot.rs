//! CallMeBot API client for WhatsApp

use std::time::Duration;

use callbot_core::WhatsAppConfig;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, WhatsAppError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// CallMeBot API client
#[derive(Debug, Clone)]
pub struct CallMeBotClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// Query string of a send request
#[derive(Debug, Serialize)]
struct SendMessageQuery<'a> {
    phone: &'a str,
    text: &'a str,
    apikey: &'a str,
}

impl CallMeBotClient {
    /// Create a new CallMeBot client
    pub fn new(config: &WhatsAppConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a WhatsApp message and return the gateway's response body
    pub async fn send_message(&self, phone: &str, text: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(WhatsAppError::ApiKeyNotSet)?;

        info!("Sending WhatsApp message to {}", phone);

        let url = format!("{}/whatsapp.php", self.base_url);
        let query = SendMessageQuery {
            phone,
            text,
            apikey: api_key,
        };

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WhatsAppError::Api(format!(
                "Failed to send message: {} - {}",
                status, body
            )));
        }

        debug!("CallMeBot response: {}", body);
        Ok(body)
    }
}
