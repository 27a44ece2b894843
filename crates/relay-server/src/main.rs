use relay::providers::anthropic::AnthropicProvider;
use relay::systems::{Toolbox, WeatherSystem};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod configuration;
mod error;
mod routes;
mod state;

use configuration::Settings;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let settings = Settings::new()?;
    let addr = settings.server.socket_addr()?;

    // Create app state
    let provider = AnthropicProvider::new(settings.provider.into_config())?;
    let toolbox = Toolbox::new().with_system(Box::new(WeatherSystem::new()));
    let state = AppState::new(Arc::new(provider), Arc::new(toolbox));

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
