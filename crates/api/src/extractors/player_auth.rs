//! Authenticated player extractor.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Identity established by the auth middleware, available to handlers as
/// an extractor.
#[derive(Debug, Clone)]
pub struct PlayerAuth {
    pub player_id: i64,
    /// Canonical in-game name from the token.
    pub name: String,
    pub is_admin: bool,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PlayerAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<PlayerAuth>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Authentication required"
                })),
            )
                .into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_auth_clone() {
        let auth = PlayerAuth {
            player_id: 42,
            name: "Steve".to_string(),
            is_admin: false,
        };
        let cloned = auth.clone();
        assert_eq!(cloned.player_id, 42);
        assert_eq!(cloned.name, "Steve");
        assert!(!cloned.is_admin);
    }
}
