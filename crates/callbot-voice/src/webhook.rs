//! Voice webhook routes
//!
//! Both endpoints answer `200 text/xml` no matter what happens upstream: an
//! error status would leave the caller in silence.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use tracing::{error, warn};

use crate::flow::{CallFlowController, IncomingCall, SpeechTurn};
use crate::twiml::VoiceResponse;

/// Served when a document cannot be rendered or a webhook body cannot be read
pub const FALLBACK_TWIML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "<Response><Say>I'm sorry, I had trouble understanding. Please try again.</Say></Response>"
);

/// Form fields posted when a call is answered
#[derive(Debug, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
    #[serde(rename = "From", default)]
    pub from: String,
}

/// Form fields posted when a speech capture completes
#[derive(Debug, Deserialize)]
pub struct SpeechWebhook {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: String,
}

/// `/webhook/voice` and `/webhook/process-speech`
pub fn router(controller: Arc<CallFlowController>) -> Router {
    Router::new()
        .route("/webhook/voice", post(handle_voice))
        .route("/webhook/process-speech", post(handle_speech))
        .with_state(controller)
}

async fn handle_voice(
    State(controller): State<Arc<CallFlowController>>,
    hook: Result<Form<VoiceWebhook>, FormRejection>,
) -> Response {
    let Form(hook) = match hook {
        Ok(form) => form,
        Err(rejection) => return rejected("voice", rejection),
    };
    let call = IncomingCall {
        call_sid: hook.call_sid,
        from: hook.from,
    };
    twiml(controller.start_call(&call).await)
}

async fn handle_speech(
    State(controller): State<Arc<CallFlowController>>,
    hook: Result<Form<SpeechWebhook>, FormRejection>,
) -> Response {
    let Form(hook) = match hook {
        Ok(form) => form,
        Err(rejection) => return rejected("process-speech", rejection),
    };
    let turn = SpeechTurn {
        call_sid: hook.call_sid,
        speech_result: hook.speech_result,
    };
    twiml(controller.process_speech(&turn).await)
}

/// An unreadable webhook body still gets spoken audio
fn rejected(hook: &str, rejection: FormRejection) -> Response {
    warn!("Unreadable {} webhook ({}): {}", hook, rejection.status(), rejection.body_text());
    xml_response(FALLBACK_TWIML.to_string())
}

fn twiml(response: VoiceResponse) -> Response {
    let body = match response.render() {
        Ok(xml) => xml,
        Err(e) => {
            error!("Failed to render TwiML: {}", e);
            FALLBACK_TWIML.to_string()
        }
    };
    xml_response(body)
}

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
