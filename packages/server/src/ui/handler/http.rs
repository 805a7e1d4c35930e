//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{ChatHistoryDto, RoomSummaryDto},
    ui::state::AppState,
    usecase::RouterError,
};

/// Welcome message
pub async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Chatbot API. Please connect via WebSocket."
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.router.list_rooms().await;
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room history by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<ChatHistoryDto>, StatusCode> {
    let room_id = RoomId::try_from(room_id).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.router.room_snapshot(&room_id).await {
        Ok(room) => Ok(Json(ChatHistoryDto::from(&room))),
        Err(RouterError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(%room_id, error = %e, "failed to read room");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
