//! Parley application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the language-model backend
//! 3. Either serve the skill endpoint, or run a single turn from the command
//!    line (`ask` / `handle`) for local testing without a device

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use parley_api::routes;
use parley_api::state::AppState;
use parley_core::config::ParleyConfig;
use parley_core::error::ParleyError;
use parley_skill::envelope::{SkillRequest, SkillResponse};
use parley_skill::handler::SkillHandler;
use parley_skill::model::{EchoModel, LanguageModel};
use parley_skill::ssml::strip_markup;

/// Session id used for synthetic command-line requests.
const CLI_SESSION_ID: &str = "test-session-id";

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Voice-assistant skill backed by a chat model")]
#[command(version)]
struct Cli {
    /// Config file (default: $PARLEY_CONFIG or ~/.parley/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the skill HTTP endpoint
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask one question as if spoken to the device
    Ask {
        /// The question
        query: String,
        /// File carrying session attributes between invocations
        #[arg(long)]
        session_file: Option<PathBuf>,
        /// Use the offline echo model instead of the configured backend
        #[arg(long)]
        offline: bool,
    },
    /// Run one raw platform request from a JSON file and print the reply
    Handle {
        /// Path to the request JSON
        request: PathBuf,
        /// Use the offline echo model instead of the configured backend
        #[arg(long)]
        offline: bool,
    },
}

/// Resolve the config file path (--config, PARLEY_CONFIG env, or ~/.parley/config.toml).
fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(p) = explicit {
        return p;
    }
    if let Ok(p) = std::env::var("PARLEY_CONFIG") {
        return PathBuf::from(p);
    }
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    PathBuf::from("config.toml")
}

fn build_model(
    config: &ParleyConfig,
    offline: bool,
) -> Result<Arc<dyn LanguageModel>, ParleyError> {
    if offline {
        return Ok(Arc::new(EchoModel));
    }
    parley_llm::build_model(&config.model)
}

/// Read carried-over session attributes. A missing file starts a new session.
fn load_session_file(path: &Path) -> Result<Option<Value>, ParleyError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

/// Persist attributes for the next turn, or forget them once the session ended.
fn save_session_file(
    path: &Path,
    attributes: &Map<String, Value>,
    ended: bool,
) -> Result<(), ParleyError> {
    if ended {
        if path.exists() {
            std::fs::remove_file(path)?;
            tracing::debug!(path = %path.display(), "Session ended, removed session file");
        }
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(attributes)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Human-readable rendering of a reply: speech, reprompt and pending follow-ups.
fn render_reply(reply: &SkillResponse) -> String {
    let mut out = speakable(&reply.response.output_speech.ssml);

    if let Some(reprompt) = &reply.response.reprompt {
        out.push_str("\n\nReprompt: ");
        out.push_str(&speakable(&reprompt.output_speech.ssml));
    }

    let followups: Vec<&str> = reply
        .session_attributes
        .get("followup_questions")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !followups.is_empty() {
        out.push_str("\n\nFollow-up questions:");
        for (i, question) in followups.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, question));
        }
    }

    if reply.response.should_end_session {
        out.push_str("\n\n(session ended)");
    }
    out
}

fn speakable(ssml: &str) -> String {
    strip_markup(ssml).split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn ask(
    config: &ParleyConfig,
    query: &str,
    session_file: Option<&Path>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let attributes = match session_file {
        Some(path) => load_session_file(path)?,
        None => None,
    };
    let handler = SkillHandler::new(config, build_model(config, offline)?);
    let request = SkillRequest::intent_query(
        CLI_SESSION_ID,
        &config.skill.query_intent,
        &config.skill.query_slot,
        query,
        attributes,
    );

    let reply = handler.handle(&request).await;
    if let Some(path) = session_file {
        save_session_file(path, &reply.session_attributes, reply.response.should_end_session)?;
    }
    println!("{}", render_reply(&reply));
    Ok(())
}

async fn handle(
    config: &ParleyConfig,
    request_path: &Path,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(request_path)?;
    let raw: Value = serde_json::from_str(&content)?;
    let handler = SkillHandler::new(config, build_model(config, offline)?);
    let reply = handler.handle_value(&raw).await;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_file = config_path(cli.config);
    let mut config = ParleyConfig::load_or_default(&config_file);

    // Tracing. Logs go to stderr so `ask` and `handle` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(path = %config_file.display(), "Configuration loaded");

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.general.port = port;
            }
            tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
            let model = parley_llm::build_model(&config.model)?;
            let state = AppState::new(config, model);
            routes::start_server(state).await?;
        }
        Commands::Ask {
            query,
            session_file,
            offline,
        } => ask(&config, &query, session_file.as_deref(), offline).await?,
        Commands::Handle { request, offline } => handle(&config, &request, offline).await?,
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
