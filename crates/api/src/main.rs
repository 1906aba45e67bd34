//! Prism chat backend HTTP API.
//!
//! Wires the pipeline together: Postgres persistence, the Gemini model,
//! the GitHub integration, and the conversation orchestrator, exposed over
//! axum with CORS for the frontend.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use database::Database;
use gemini_brain::GeminiBrain;
use github_client::GitHubClient;
use orchestrator::{ChatOrchestrator, ContextRetriever, IntegrationManager};
use token_vault::TokenVault;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

/// How often expired OAuth handshakes are swept.
const HANDSHAKE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Prism API");

    // Connect to database and run migrations (enables pgvector)
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build components
    let vault = TokenVault::from_env("ENCRYPTION_KEY")?;
    let github = GitHubClient::from_env()?;
    let brain = GeminiBrain::from_env()?;

    let integrations = Arc::new(IntegrationManager::new(
        db.clone(),
        vault,
        github,
        config.frontend_url.clone(),
    ));

    let retriever = ContextRetriever::new(db.clone(), integrations.clone());
    let chat = Arc::new(ChatOrchestrator::new(db.clone(), brain, retriever));

    // Periodically drop expired OAuth handshakes
    let sweeper = integrations.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HANDSHAKE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sweeper.sweep_handshakes().await;
            if removed > 0 {
                info!(removed, "Swept expired OAuth handshakes");
            }
        }
    });

    // Build application state and router
    let state = AppState::new(db, chat, integrations);

    let cors = match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!("FRONTEND_URL is not a valid origin; allowing any origin");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let app = routes::router().layer(cors).with_state(state);

    // Start server
    info!(addr = %config.addr, "Prism API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
