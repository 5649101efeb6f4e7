//! Spoken-reply generation
//!
//! [`ReplyGenerator`] never fails: every upstream problem collapses into
//! [`APOLOGY`] so the live call always has something to say.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::llm::LlmClient;

/// Spoken when a reply cannot be generated
pub const APOLOGY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again.";

/// Produces the assistant's answer to one caller utterance
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply for `utterance`. `context` describes the business and
    /// may be empty. The result is never empty.
    async fn generate(&self, utterance: &str, context: &str) -> String;
}

/// [`ReplyGenerator`] backed by a hosted language model
pub struct AssistantReplier {
    client: LlmClient,
    max_tokens: u64,
}

impl AssistantReplier {
    pub fn new(client: LlmClient, max_tokens: u64) -> Self {
        Self { client, max_tokens }
    }

    fn system_prompt(context: &str) -> String {
        let context = context.trim();
        if context.is_empty() {
            "You are a helpful business assistant. Keep responses concise and friendly. \
             If asked about orders or payments, guide them through the process."
                .to_string()
        } else {
            format!(
                "You are a helpful business assistant. {} Keep responses concise and friendly. \
                 If asked about orders or payments, guide them through the process.",
                context
            )
        }
    }
}

#[async_trait]
impl ReplyGenerator for AssistantReplier {
    async fn generate(&self, utterance: &str, context: &str) -> String {
        if utterance.trim().is_empty() {
            debug!("Empty utterance, skipping completion");
            return APOLOGY.to_string();
        }

        // Single attempt: retrying would stretch a live call.
        let request = self
            .client
            .request_builder()
            .system(Self::system_prompt(context))
            .max_tokens(self.max_tokens)
            .user(utterance)
            .build();

        match self.client.complete(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                error!("LLM returned an empty reply");
                APOLOGY.to_string()
            }
            Err(e) => {
                error!("LLM error: {}", e);
                APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, LlmProvider};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn replier(server: &MockServer) -> AssistantReplier {
        let config = LlmConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            provider: LlmProvider::OpenAi,
            base_url: None,
            max_tokens: 150,
        };
        let client = LlmClient::with_base_url(&config, server.uri()).unwrap();
        AssistantReplier::new(client, config.max_tokens)
    }

    fn completion(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        }))
    }

    #[test]
    fn test_system_prompt_with_and_without_context() {
        let bare = AssistantReplier::system_prompt("  ");
        assert!(bare.starts_with("You are a helpful business assistant. Keep"));

        let with = AssistantReplier::system_prompt("We sell bread.");
        assert!(with.starts_with("You are a helpful business assistant. We sell bread. Keep"));
    }

    #[tokio::test]
    async fn test_generate_returns_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "max_tokens": 150,
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "what are your hours"}
                ]
            })))
            .respond_with(completion("We're open 9 to 5."))
            .expect(1)
            .mount(&server)
            .await;

        let reply = replier(&server).await.generate("what are your hours", "").await;
        assert_eq!(reply, "We're open 9 to 5.");
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let reply = replier(&server).await.generate("hello", "").await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let reply = replier(&server).await.generate("hello", "").await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_blank_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("   "))
            .mount(&server)
            .await;

        let reply = replier(&server).await.generate("hello", "").await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_empty_utterance_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let reply = replier(&server).await.generate("", "context").await;
        assert_eq!(reply, APOLOGY);
    }
}
