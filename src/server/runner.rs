//! Server execution logic.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{
    handler::{debug_state, get_room_detail, get_rooms, health_check, websocket_handler},
    pusher::WebSocketMessagePusher,
    shutdown::shutdown_signal,
    state::AppState,
};

/// Default listen port, overridable via `--port` or the `PORT` environment
/// variable.
pub const DEFAULT_PORT: u16 = 8080;

/// Run the signaling server.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(
    host: String,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let pusher = WebSocketMessagePusher::new();
    let app_state = AppState::new(pusher);

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .route("/debug/state", get(debug_state))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Signaling server listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
