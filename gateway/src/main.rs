use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chat;
mod config;
mod error;
mod realtime;
mod realtime_routes;
mod routes;
mod sim_state;
mod store;

use config::GatewayConfig;
use sim_state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ew_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!("   Loaded environment from {}", path.display());
    }

    let config = GatewayConfig::from_env()?;
    let addr = config.bind_addr.clone();

    let state = AppState::new(config);
    state.store.seed_countermeasures();

    tracing::info!("EW Gateway starting on {}", addr);
    tracing::info!(
        "   Feed: {} emitters every {:?}",
        state.feed.working_set().len(),
        state.config.feed.interval
    );
    match state.config.sim_seed {
        Some(seed) => tracing::info!("   Simulation seed: {}", seed),
        None => tracing::info!("   Simulation seed: entropy"),
    }
    if !state.chat.is_configured() {
        tracing::warn!("   No LLM API key set - AI assistant offline");
    }

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
