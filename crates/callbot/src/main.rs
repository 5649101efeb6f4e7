//! callbot: voice-call bot and admin server
//!
//! Usage:
//!   callbot                   - Start the server
//!   callbot --config <path>   - Start with an explicit TOML config file
//!   callbot --help            - Show help

use std::sync::Arc;

use callbot_api::AppState;
use callbot_core::{AssistantReplier, Config, LlmClient, SqliteStore};
use callbot_payments::{PaymentGateway, StripeClient};
use callbot_voice::{CallFlowController, CallScript};
use callbot_whatsapp::CallMeBotClient;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Serve HTTP, optionally with an explicit config file
    Server { config_path: Option<String> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match parse_args(std::env::args().skip(1))? {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("callbot {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = match &config_path {
        Some(path) => Config::from_toml_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting callbot...");
    tracing::info!("Model: {} ({:?})", config.llm.model, config.llm.provider);

    run_server(config).await
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut config_path = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(path);
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("callbot - voice-call bot and admin dashboard server");
    println!();
    println!("Usage:");
    println!("  callbot                  Start the server");
    println!("  callbot --config <path>  Read settings from a TOML file (default: callbot.toml)");
    println!("  callbot --help           Show this help message");
    println!("  callbot --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY          API key (required; OPENAI_API_KEY also accepted)");
    println!("  LLM_MODEL            Model name (default: gpt-3.5-turbo)");
    println!("  LLM_PROVIDER         Provider: openai or claude (default: openai)");
    println!("  LLM_BASE_URL         Custom API endpoint");
    println!("  PORT                 HTTP port (default: 3000)");
    println!("  STATIC_DIR           Built dashboard directory (default: client/dist)");
    println!("  DB_PATH              SQLite database path (default: data/callbot.db)");
    println!("  VOICE_NAME           TwiML voice (default: alice)");
    println!("  VOICE_LANGUAGE       TwiML language (default: en-US)");
    println!("  BUSINESS_CONTEXT     Business description for the assistant");
    println!("  CALLMEBOT_API_KEY    WhatsApp gateway key (optional)");
    println!("  STRIPE_SECRET_KEY    Payments key (optional)");
}

/// Build the collaborators and serve until Ctrl+C
async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(
        SqliteStore::open(&config.database.path)
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?,
    );

    let llm_client = LlmClient::new(&config.llm)
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;
    let replier = Arc::new(AssistantReplier::new(llm_client, config.llm.max_tokens));

    let notifier = Arc::new(CallMeBotClient::new(&config.whatsapp)?);
    if !notifier.is_configured() {
        tracing::info!("WhatsApp notifications disabled (no CallMeBot key configured)");
    }

    let payments: Option<Arc<dyn PaymentGateway>> = match StripeClient::from_config(&config.payments)? {
        Some(client) => Some(Arc::new(client)),
        None => {
            tracing::info!("Payments disabled (no Stripe key configured)");
            None
        }
    };

    let controller = Arc::new(CallFlowController::new(
        store.clone(),
        replier,
        CallScript::from(&config.voice),
    ));

    let state = AppState {
        store,
        notifier,
        payments,
    };
    let app = callbot_api::app(state, controller, &config.server.static_dir);

    tracing::info!("callbot initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    callbot_api::start_server(config.server.port, app, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
