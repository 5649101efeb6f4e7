//! Configuration management
//!
//! Settings are resolved in this order of precedence:
//! 1. environment variables
//! 2. the `callbot.toml` configuration file
//! 3. built-in defaults
//!
//! `${VAR_NAME}` placeholders inside the configuration file are expanded from
//! the environment before the file is parsed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "callbot.toml";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Anthropic Messages API
    Claude,
}

impl LlmProvider {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "claude" | "anthropic" => LlmProvider::Claude,
            _ => LlmProvider::OpenAi,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Response size ceiling for a spoken reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::OpenAi,
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built dashboard bundle
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Voice call script settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Text-to-speech voice used by the telephony provider
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speech language (also used for recognition)
    #[serde(default = "default_language")]
    pub language: String,

    /// Seconds the provider waits for speech before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,

    /// Opening line spoken when a call is answered
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Free-text business context passed to the reply generator
    #[serde(default)]
    pub context: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            greeting: default_greeting(),
            context: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// CallMeBot API key; notifications are skipped when unset
    pub api_key: Option<String>,

    #[serde(default = "default_whatsapp_base_url")]
    pub base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_whatsapp_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Stripe secret key; payment endpoints are disabled when unset
    pub secret_key: Option<String>,

    #[serde(default = "default_payments_base_url")]
    pub base_url: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: default_payments_base_url(),
        }
    }
}

/// Main configuration for callbot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub payments: PaymentsConfig,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u64 {
    150
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "client/dist".to_string()
}

fn default_db_path() -> String {
    "data/callbot.db".to_string()
}

fn default_voice() -> String {
    "alice".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_secs() -> u32 {
    5
}

fn default_greeting() -> String {
    "Hello! Welcome to our business. I can help you with information about our products \
     and services. Please speak after the beep."
        .to_string()
}

fn default_whatsapp_base_url() -> String {
    "https://api.callmebot.com".to_string()
}

fn default_payments_base_url() -> String {
    "https://api.stripe.com".to_string()
}

impl Config {
    /// Replace `${VAR_NAME}` placeholders with environment values.
    ///
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let var_name = &after[..end];
                    if let Ok(env_value) = std::env::var(var_name) {
                        result.push_str(&env_value);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // unterminated placeholder, keep verbatim
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document (after placeholder expansion) without
    /// consulting any other environment variables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let toml: TomlConfig = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        Ok(Self::from_toml_config(toml))
    }

    /// Load from `callbot.toml` if present, otherwise from the environment.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY or OPENAI_API_KEY not set".to_string(),
            ));
        }
        if self.voice.timeout_secs == 0 {
            return Err(Error::Config(
                "voice.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            api_key: llm.api_key.unwrap_or_default(),
            model: llm.model.unwrap_or_else(default_model),
            provider: llm
                .provider
                .as_deref()
                .map(LlmProvider::parse)
                .unwrap_or_default(),
            base_url: llm.base_url,
            max_tokens: llm.max_tokens.unwrap_or_else(default_max_tokens),
        };

        let server = toml.server.unwrap_or_default();
        let server_config = ServerConfig {
            port: server.port.unwrap_or_else(default_port),
            static_dir: server.static_dir.unwrap_or_else(default_static_dir),
        };

        let database = toml.database.unwrap_or_default();
        let database_config = DatabaseConfig {
            path: database.path.unwrap_or_else(default_db_path),
        };

        let voice = toml.voice.unwrap_or_default();
        let voice_config = VoiceConfig {
            voice: voice.voice.unwrap_or_else(default_voice),
            language: voice.language.unwrap_or_else(default_language),
            timeout_secs: voice.timeout_secs.unwrap_or_else(default_timeout_secs),
            greeting: voice.greeting.unwrap_or_else(default_greeting),
            context: voice.context.unwrap_or_default(),
        };

        let whatsapp = toml.whatsapp.unwrap_or_default();
        let whatsapp_config = WhatsAppConfig {
            api_key: whatsapp.api_key.filter(|k| !k.trim().is_empty()),
            base_url: whatsapp
                .base_url
                .unwrap_or_else(default_whatsapp_base_url),
        };

        let payments = toml.payments.unwrap_or_default();
        let payments_config = PaymentsConfig {
            secret_key: payments.secret_key.filter(|k| !k.trim().is_empty()),
            base_url: payments
                .base_url
                .unwrap_or_else(default_payments_base_url),
        };

        Config {
            llm: llm_config,
            server: server_config,
            database: database_config,
            voice: voice_config,
            whatsapp: whatsapp_config,
            payments: payments_config,
        }
    }

    /// Override settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(key) = non_empty_env("LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(model) = non_empty_env("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(provider) = non_empty_env("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(base_url) = non_empty_env("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }

        if let Some(port) = non_empty_env("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = non_empty_env("STATIC_DIR") {
            self.server.static_dir = dir;
        }

        if let Some(path) = non_empty_env("DB_PATH") {
            self.database.path = path;
        }

        if let Some(voice) = non_empty_env("VOICE_NAME") {
            self.voice.voice = voice;
        }
        if let Some(language) = non_empty_env("VOICE_LANGUAGE") {
            self.voice.language = language;
        }
        if let Some(context) = non_empty_env("BUSINESS_CONTEXT") {
            self.voice.context = context;
        }

        if let Some(key) = non_empty_env("CALLMEBOT_API_KEY") {
            self.whatsapp.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("STRIPE_SECRET_KEY") {
            self.payments.secret_key = Some(key);
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<TomlLlmConfig>,
    server: Option<TomlServerConfig>,
    database: Option<TomlDatabaseConfig>,
    voice: Option<TomlVoiceConfig>,
    whatsapp: Option<TomlWhatsAppConfig>,
    payments: Option<TomlPaymentsConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    /// "openai" or "claude"
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    port: Option<u16>,
    static_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlVoiceConfig {
    voice: Option<String>,
    language: Option<String>,
    timeout_secs: Option<u32>,
    greeting: Option<String>,
    context: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlWhatsAppConfig {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlPaymentsConfig {
    secret_key: Option<String>,
    base_url: Option<String>,
}
