//! Game-server action endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use shared::validation::validate_player_name;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::rcon::{CommandExecutor, OnlinePlayer, RconError};

fn map_rcon_error(e: RconError) -> ApiError {
    match e {
        RconError::UnknownServer(id) => ApiError::NotFound(format!("Unknown server '{}'", id)),
        other => ApiError::ServiceUnavailable(format!("Game server unreachable: {}", other)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayersResponse {
    pub server_id: String,
    pub players: Vec<OnlinePlayer>,
}

/// Who is online on a server.
///
/// GET /api/v1/server/:server_id/players
pub async fn online_players(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<OnlinePlayersResponse>, ApiError> {
    let players = state
        .executor
        .list_online_players(&server_id)
        .await
        .map_err(map_rcon_error)?;

    Ok(Json(OnlinePlayersResponse { server_id, players }))
}

/// RCON connection health per server (admin).
///
/// GET /api/v1/admin/server/status
pub async fn server_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.executor.status().await;
    Json(serde_json::json!({ "servers": status }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TellRequest {
    pub server_id: Option<String>,
    pub player_name: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub response: String,
}

/// Whisper a message to one player (admin).
///
/// POST /api/v1/admin/server/tell
pub async fn tell_player(
    State(state): State<AppState>,
    Json(request): Json<TellRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    validate_player_name(&request.player_name)
        .map_err(|_| ApiError::Validation("Invalid player name".into()))?;

    let server_id = request
        .server_id
        .as_deref()
        .unwrap_or_else(|| state.executor.default_server_id())
        .to_string();

    let command = format!("tell {} {}", request.player_name, request.message);
    let response = state
        .executor
        .execute(&server_id, &command)
        .await
        .map_err(map_rcon_error)?;

    Ok(Json(CommandResponse { response }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub server_id: Option<String>,
    pub message: String,
}

/// Broadcast a message to everyone on a server (admin).
///
/// POST /api/v1/admin/server/broadcast
pub async fn broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let server_id = request
        .server_id
        .as_deref()
        .unwrap_or_else(|| state.executor.default_server_id())
        .to_string();

    let command = format!("say {}", request.message);
    let response = state
        .executor
        .execute(&server_id, &command)
        .await
        .map_err(map_rcon_error)?;

    Ok(Json(CommandResponse { response }))
}
