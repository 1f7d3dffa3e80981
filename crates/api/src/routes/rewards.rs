//! Playtime reward endpoint handlers.

use axum::{extract::State, Json};

use domain::models::reward::PlaytimeRewardStatus;
use persistence::repositories::PlaytimeRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::PlayerAuth;

/// The player's playtime accrual state.
///
/// GET /api/v1/rewards/playtime
pub async fn playtime_status(
    State(state): State<AppState>,
    auth: PlayerAuth,
) -> Result<Json<PlaytimeRewardStatus>, ApiError> {
    let repo = PlaytimeRepository::new(state.pool.clone());
    let watermark = repo.watermark(auth.player_id).await?;

    let status = match watermark {
        Some(w) => PlaytimeRewardStatus {
            total_active_minutes: w.total_active_minutes,
            coins_awarded: w.coins_awarded,
            last_awarded_at: w.last_awarded_at,
        },
        None => PlaytimeRewardStatus {
            total_active_minutes: 0,
            coins_awarded: 0,
            last_awarded_at: None,
        },
    };

    Ok(Json(status))
}
