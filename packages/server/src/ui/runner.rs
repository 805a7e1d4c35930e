//! Server runner: route table, listener and graceful shutdown.

use std::{future::Future, sync::Arc};

use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        admin_ws_handler, agent_ws_handler, get_room_detail, get_rooms, health_check,
        user_ws_handler, welcome,
    },
    signal::shutdown_signal,
    state::AppState,
};
use crate::{config::Config, error::ServerError, usecase::Router};

/// Build the axum application.
pub fn build_app(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/", get(welcome))
        // WebSocket channels
        .route("/ws", get(user_ws_handler))
        .route("/agent", get(agent_ws_handler))
        .route("/admin", get(admin_ws_handler))
        // HTTP API
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Pending store writes are flushed before returning.
pub async fn serve<F>(
    listener: TcpListener,
    router: Arc<Router>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(Arc::new(AppState::new(router.clone())));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    router.flush_mirror().await;
    tracing::info!("server stopped");
    Ok(())
}

/// Run the server with the given configuration until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let router = Arc::new(config.build_router()?);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    tracing::info!("user channel: ws://{}/ws", addr);
    tracing::info!("agent channel: ws://{}/agent", addr);
    tracing::info!("admin channel: ws://{}/admin", addr);

    serve(listener, router, shutdown_signal()).await
}
