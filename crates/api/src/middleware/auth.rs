//! JWT authentication middleware.
//!
//! Validates the Bearer token and stores the authenticated player
//! identity in request extensions for downstream handlers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use shared::jwt::extract_player_id;

use crate::app::AppState;
use crate::extractors::PlayerAuth;

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn validate(state: &AppState, token: &str) -> Result<PlayerAuth, String> {
    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|e| format!("Invalid token: {}", e))?;

    let player_id = extract_player_id(&claims).map_err(|_| "Invalid player id in token")?;

    Ok(PlayerAuth {
        player_id,
        name: claims.name,
        is_admin: claims.admin,
    })
}

/// Middleware requiring a valid player access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    match validate(&state, token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            unauthorized_response("Invalid or expired token")
        }
    }
}

/// Middleware requiring a valid token carrying the admin flag.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    match validate(&state, token) {
        Ok(auth) if auth.is_admin => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Ok(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Admin privileges required"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            unauthorized_response("Invalid or expired token")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
