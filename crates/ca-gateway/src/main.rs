//! calendar-assistant: Calendar Assistant Main Binary
//!
//! Usage:
//!   calendar-assistant            - Start the HTTP API server
//!   calendar-assistant --help     - Show help
//!   calendar-assistant --version  - Show version

use std::sync::Arc;

use ca_api::AppState;
use ca_core::{Config, EventStore, LlmClient, StoreChange, TextGenerator};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// HTTP API server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args(std::env::args().skip(1)) {
        RunMode::Help => {
            print_help();
            Ok(())
        }
        RunMode::Version => {
            println!("calendar-assistant {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        RunMode::Server => run_server().await,
    }
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> RunMode {
    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("calendar-assistant - Conversational schedule assistant");
    println!();
    println!("Usage:");
    println!("  calendar-assistant            Start the HTTP API server");
    println!("  calendar-assistant --help     Show this help message");
    println!("  calendar-assistant --version  Show version");
    println!();
    println!("Configuration is read from calendar-assistant.toml and the environment.");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY          API key (falls back to MISTRAL_API_KEY)");
    println!("  LLM_MODEL            Model name (default: mistral-large-latest)");
    println!("  LLM_PROVIDER         Provider: mistral, claude or openai (default: mistral)");
    println!("  LLM_BASE_URL         Custom API endpoint");
    println!("  LLM_MAX_TOKENS       Reply token limit (default: 1024)");
    println!("  API_KEY              Bearer key required on /api routes (optional)");
    println!("  API_PORT             HTTP API port (default: 3000)");
    println!("  API_ALLOWED_ORIGINS  Comma-separated CORS origins (default: any)");
    println!("  SEED_SAMPLE_EVENTS   Start with the sample day (default: true)");
}

/// Run the HTTP API server until Ctrl+C
async fn run_server() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting calendar-assistant...");

    let generator: Option<Arc<dyn TextGenerator>> = if config.llm.is_configured() {
        let client = LlmClient::new(&config.llm)
            .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;
        tracing::info!("Provider: {:?}, model: {}", client.provider(), client.model());
        Some(Arc::new(client))
    } else {
        tracing::warn!("LLM API key not configured, chat replies will use the fallback message");
        None
    };

    let mut events = if config.schedule.seed_sample_events {
        EventStore::with_sample_events()
    } else {
        EventStore::new()
    };
    events.subscribe(|change| match change {
        StoreChange::Added(event) => tracing::info!(
            "Schedule: added {} at {} ({})",
            event.fields.title(),
            event.fields.time(),
            event.id
        ),
        StoreChange::Updated(event) => tracing::info!(
            "Schedule: updated {} at {} ({})",
            event.fields.title(),
            event.fields.time(),
            event.id
        ),
        StoreChange::Removed(id) => tracing::info!("Schedule: removed {}", id),
    });
    tracing::info!("Loaded {} events", events.len());

    let api_port = config.api.port;
    let state = AppState::new(config, generator, events);

    let handle = tokio::spawn(async move {
        if let Err(e) = ca_api::start_server(state).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });
    tracing::info!("HTTP API server started on port {}", api_port);
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    handle.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(args(&[])), RunMode::Server));
        assert!(matches!(parse_args(args(&["--help"])), RunMode::Help));
        assert!(matches!(parse_args(args(&["-v"])), RunMode::Version));
        assert!(matches!(parse_args(args(&["--verbose", "-h"])), RunMode::Help));
    }
}
