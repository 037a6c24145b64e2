//! crm-api - CRM HTTP API service
//!
//! Serves the contact/deal/activity CRUD surface, the dashboard aggregation
//! endpoint, and the AI-agent proxy endpoints over a shared SQLite store.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use crm_api::{build_router, services::LlmClient, AppState};
use crm_common::config::{database_path, resolve_root_folder, TomlConfig};
use crm_common::db::init_database;

/// Command-line arguments for crm-api
#[derive(Parser, Debug)]
#[command(name = "crm-api")]
#[command(about = "CRM HTTP API service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "CRM_API_PORT")]
    port: u16,

    /// Root folder containing the CRM database
    #[arg(short, long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting CRM API (crm-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = TomlConfig::load();
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = database_path(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    // AI-agent endpoints need a completion API key; without one they return
    // a structured 500 instead of failing at startup
    let llm = match LlmClient::from_config(&toml_config) {
        Some(client) => {
            info!("✓ Completion API client configured (model {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("No ANTHROPIC_API_KEY configured; AI-agent endpoints will return errors");
            None
        }
    };

    let state = AppState::new(pool, llm);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("crm-api listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
