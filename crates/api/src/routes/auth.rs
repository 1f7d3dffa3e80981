//! Authentication endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use validator::Validate;

use domain::models::player::{LoginRequest, Player, RefreshRequest, RegisterRequest, TokenPair};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::AuthService;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub player: Player,
    pub tokens: TokenPair,
}

/// Register a new player account.
///
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let (player, tokens) = service.register(request).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { player, tokens })))
}

/// Log in with name and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let (player, tokens) = service.login(&request.name, &request.password).await?;

    Ok(Json(AuthResponse { player, tokens }))
}

/// Exchange a refresh token for a fresh token pair.
///
/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let tokens = service.refresh(&request.refresh_token).await?;

    Ok(Json(tokens))
}
