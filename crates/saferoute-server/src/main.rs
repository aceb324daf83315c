//! SafeRoute server - hazard-avoiding walking routes over HTTP

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saferoute_server::api;
use saferoute_server::config::Config;
use saferoute_server::state::{load_graph, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saferoute_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting SafeRoute server...");

    let config = Config::from_env();
    let port = config.server_port;
    let graph = load_graph(&config);
    let state = Arc::new(AppState::from_config(config, graph));
    tracing::info!(
        "Strategy chain: {}",
        state
            .planner()
            .active_strategies()
            .iter()
            .map(|strategy| strategy.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
