//! LLM API HTTP Client

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};

use super::types::*;

/// Upper bound for one completion; a caller is waiting on the line.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// LLM API client (OpenAI-compatible or Anthropic)
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match config.provider {
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            provider: config.provider.clone(),
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &LlmConfig, base_url: impl Into<String>) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url.into();
        Ok(client)
    }

    /// Run one completion and return the generated text
    pub async fn complete(&self, request: MessagesRequest) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAi => self.send_openai_request(&request).await,
            LlmProvider::Claude => self.send_claude_request(&request).await,
        }
    }

    async fn send_claude_request(&self, request: &MessagesRequest) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        debug!("Sending request to Anthropic API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Anthropic API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmApi(format!("Failed to parse response: {} - {}", e, body)))?;

        info!(
            "Anthropic API response: stop_reason={:?}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed.text())
    }

    async fn send_openai_request(&self, request: &MessagesRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let openai_request = ChatCompletionRequest::from_messages_request(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmApi(format!("Failed to parse response: {} - {}", e, body)))?;

        info!(
            "OpenAI API response: finish_reason={:?}, tokens={}",
            parsed.choices.first().and_then(|c| c.finish_reason.as_deref()),
            parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0)
        );

        parsed
            .text()
            .map(str::to_string)
            .ok_or_else(|| Error::LlmApi("Response contained no choices".to_string()))
    }

    /// Create a request builder bound to the configured model
    pub fn request_builder(&self) -> MessagesRequestBuilder {
        MessagesRequestBuilder::new(self.model.clone())
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(provider: LlmProvider) -> LlmConfig {
        LlmConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            provider,
            base_url: None,
            max_tokens: 150,
        }
    }

    #[test]
    fn test_default_base_urls() {
        let openai = LlmClient::new(&config(LlmProvider::OpenAi)).unwrap();
        assert_eq!(openai.base_url, "https://api.openai.com/v1");

        let claude = LlmClient::new(&config(LlmProvider::Claude)).unwrap();
        assert_eq!(claude.base_url, "https://api.anthropic.com/v1");
        assert_eq!(claude.model(), "test-model");
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "max_tokens": 150,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi there!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
            })))
            .mount(&server)
            .await;

        let client =
            LlmClient::with_base_url(&config(LlmProvider::OpenAi), server.uri()).unwrap();
        let request = client
            .request_builder()
            .system("be brief")
            .max_tokens(150)
            .user("hello")
            .build();

        assert_eq!(client.complete(request).await.unwrap(), "Hi there!");
    }

    #[tokio::test]
    async fn test_claude_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({"system": "be brief"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Hello!"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 5, "output_tokens": 2}
            })))
            .mount(&server)
            .await;

        let client =
            LlmClient::with_base_url(&config(LlmProvider::Claude), server.uri()).unwrap();
        let request = client.request_builder().system("be brief").user("hi").build();

        assert_eq!(client.complete(request).await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client =
            LlmClient::with_base_url(&config(LlmProvider::OpenAi), server.uri()).unwrap();
        let request = client.request_builder().user("hi").build();

        let err = client.complete(request).await.unwrap_err();
        assert!(matches!(err, Error::LlmApi(ref msg) if msg.contains("quota exceeded")));
    }
}
