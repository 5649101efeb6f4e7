//! Call flow: the two-turn script every inbound call follows
//!
//! The controller keeps no per-call state. Everything it needs arrives with
//! the webhook (`CallSid`, caller, speech) and everything it learns goes to
//! the [`TranscriptStore`].

use std::sync::Arc;

use callbot_core::{ReplyGenerator, TranscriptStore, VoiceConfig};
use tracing::{error, info, warn};

use crate::twiml::{Gather, Say, VoiceResponse};

pub const SPEECH_ACTION: &str = "/webhook/process-speech";
pub const FIRST_PROMPT: &str = "Please tell me how I can help you today.";
pub const NO_INPUT: &str = "I didn't hear anything. Please call back when you're ready to speak.";
pub const FOLLOW_UP_PROMPT: &str = "Is there anything else I can help you with?";
pub const GOODBYE: &str = "Thank you for calling. Have a great day!";
pub const START_ERROR: &str = "I'm sorry, there was an error. Please try calling again.";

/// Fixed wording and speech settings for every call
#[derive(Debug, Clone)]
pub struct CallScript {
    pub voice: String,
    pub language: String,
    pub timeout_secs: u32,
    pub action: String,
    pub greeting: String,
    /// Business description handed to the reply generator
    pub context: String,
}

impl From<&VoiceConfig> for CallScript {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            language: config.language.clone(),
            timeout_secs: config.timeout_secs,
            action: SPEECH_ACTION.to_string(),
            greeting: config.greeting.clone(),
            context: config.context.clone(),
        }
    }
}

impl Default for CallScript {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

/// A call has just been answered
#[derive(Debug, Clone)]
pub struct IncomingCall {
    pub call_sid: String,
    pub from: String,
}

/// The provider finished a speech capture
#[derive(Debug, Clone)]
pub struct SpeechTurn {
    pub call_sid: String,
    /// Transcribed speech; empty when nothing was recognized
    pub speech_result: String,
}

pub struct CallFlowController {
    store: Arc<dyn TranscriptStore>,
    replier: Arc<dyn ReplyGenerator>,
    script: CallScript,
}

impl CallFlowController {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        replier: Arc<dyn ReplyGenerator>,
        script: CallScript,
    ) -> Self {
        Self {
            store,
            replier,
            script,
        }
    }

    /// Log the call, greet, and listen for the caller's request
    pub async fn start_call(&self, call: &IncomingCall) -> VoiceResponse {
        info!("Incoming call {} from {}", call.call_sid, call.from);

        // The record must exist before the caller hears anything.
        if let Err(e) = self.store.create_call(&call.call_sid, &call.from).await {
            error!("Failed to log call {}: {}", call.call_sid, e);
            return VoiceResponse::new().say(Say::new(START_ERROR));
        }

        VoiceResponse::new()
            .say(self.voiced(&self.script.greeting))
            .gather(self.listen(FIRST_PROMPT))
            .say(Say::new(NO_INPUT))
    }

    /// Answer the caller, record the exchange, offer one more turn
    pub async fn process_speech(&self, turn: &SpeechTurn) -> VoiceResponse {
        info!("Speech on call {}: {:?}", turn.call_sid, turn.speech_result);

        let reply = self
            .replier
            .generate(&turn.speech_result, &self.script.context)
            .await;

        match self
            .store
            .attach_transcript(&turn.call_sid, &turn.speech_result, &reply)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Transcript for {} not saved (no call record, or already recorded)",
                turn.call_sid
            ),
            Err(e) => error!("Failed to save transcript for {}: {}", turn.call_sid, e),
        }

        VoiceResponse::new()
            .say(self.voiced(&reply))
            .gather(self.listen(FOLLOW_UP_PROMPT))
            .say(Say::new(GOODBYE))
            .hangup()
    }

    fn voiced(&self, text: &str) -> Say {
        Say::new(text).with_voice(&self.script.voice, &self.script.language)
    }

    fn listen(&self, prompt: &str) -> Gather {
        Gather::speech(self.script.timeout_secs, &self.script.action).say(Say::new(prompt))
    }
}
