mod config;
mod errors;
mod form;
mod models;
mod routes;
mod state;
mod submit_client;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::form::FormRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::submit_client::SubmitClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},tower_http={level}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting apply-form v{}", env!("CARGO_PKG_VERSION"));

    let client = SubmitClient::new(&config.api_base_url, config.request_timeout);
    info!("Applications are submitted to {}", client.endpoint());
    match config.request_timeout {
        Some(timeout) => info!("API request timeout: {}s", timeout.as_secs()),
        None => info!("API request timeout: none"),
    }

    let forms = FormRegistry::new(
        Arc::new(client),
        config.session_idle_timeout,
        config.max_sessions,
    );
    info!(
        "Holding up to {} visitor forms, idle timeout {}s",
        config.max_sessions,
        config.session_idle_timeout.as_secs()
    );

    let state = AppState {
        forms: Arc::new(forms),
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
