//! Colloquy REST API entry point.
//!
//! Binary name: `colloquy`
//!
//! Initializes tracing, loads configuration, wires the completion
//! gateway and context store, then serves the REST API.

mod http;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let enable_otel = std::env::var("COLLOQUY_OTEL")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    colloquy_observe::tracing_setup::init_tracing(enable_otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let app_state = AppState::init().await?;
    let addr = format!(
        "{}:{}",
        app_state.config.server.host, app_state.config.server.port
    );

    let router = http::router::build_router(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "colloquy listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    colloquy_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
