//! TwiML document builder
//!
//! Only the verbs the call flow needs: `<Say>`, speech `<Gather>` and
//! `<Hangup/>`.

use quick_xml::{
    Writer,
    escape::partial_escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::{Result, VoiceError};

/// Spoken text, optionally with an explicit voice and language
#[derive(Debug, Clone, PartialEq)]
pub struct Say {
    text: String,
    voice: Option<(String, String)>,
}

impl Say {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>, language: impl Into<String>) -> Self {
        self.voice = Some((voice.into(), language.into()));
        self
    }

    fn write(&self, w: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new("Say");
        if let Some((voice, language)) = &self.voice {
            start.push_attribute(("voice", voice.as_str()));
            start.push_attribute(("language", language.as_str()));
        }
        emit(w, Event::Start(start))?;
        // Quotes stay literal so spoken text reads naturally in the document.
        emit(w, Event::Text(BytesText::from_escaped(partial_escape(&self.text))))?;
        emit(w, Event::End(BytesEnd::new("Say")))?;
        Ok(())
    }
}

/// Speech-capture directive; the provider posts the result to `action`
#[derive(Debug, Clone, PartialEq)]
pub struct Gather {
    timeout_secs: u32,
    action: String,
    prompts: Vec<Say>,
}

impl Gather {
    pub fn speech(timeout_secs: u32, action: impl Into<String>) -> Self {
        Self {
            timeout_secs,
            action: action.into(),
            prompts: Vec::new(),
        }
    }

    pub fn say(mut self, say: Say) -> Self {
        self.prompts.push(say);
        self
    }

    fn write(&self, w: &mut Writer<Vec<u8>>) -> Result<()> {
        let timeout = self.timeout_secs.to_string();
        let mut start = BytesStart::new("Gather");
        start.push_attribute(("input", "speech"));
        start.push_attribute(("timeout", timeout.as_str()));
        start.push_attribute(("action", self.action.as_str()));

        emit(w, Event::Start(start))?;
        for prompt in &self.prompts {
            prompt.write(w)?;
        }
        emit(w, Event::End(BytesEnd::new("Gather")))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say(Say),
    Gather(Gather),
    Hangup,
}

/// A `<Response>` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, say: Say) -> Self {
        self.verbs.push(Verb::Say(say));
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    /// Serialize to an XML document with declaration
    pub fn render(&self) -> Result<String> {
        let mut w = Writer::new(Vec::new());
        emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(&mut w, Event::Start(BytesStart::new("Response")))?;

        for verb in &self.verbs {
            match verb {
                Verb::Say(say) => say.write(&mut w)?,
                Verb::Gather(gather) => gather.write(&mut w)?,
                Verb::Hangup => emit(&mut w, Event::Empty(BytesStart::new("Hangup")))?,
            }
        }

        emit(&mut w, Event::End(BytesEnd::new("Response")))?;
        Ok(String::from_utf8(w.into_inner())?)
    }
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    w.write_event(event)
        .map_err(|e| VoiceError::Markup(e.to_string()))
}
