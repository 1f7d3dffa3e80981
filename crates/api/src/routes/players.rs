//! Player profile endpoint handlers.

use axum::{extract::State, Json};

use domain::models::player::PlayerProfile;
use persistence::repositories::{PlayerRepository, ReferralRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::PlayerAuth;

/// The authenticated player's profile and discount state.
///
/// GET /api/v1/players/me
pub async fn me(
    State(state): State<AppState>,
    auth: PlayerAuth,
) -> Result<Json<PlayerProfile>, ApiError> {
    let players = PlayerRepository::new(state.pool.clone());
    let referrals = ReferralRepository::new(state.pool.clone());

    let player = players
        .find_by_id(auth.player_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Player not found".into()))?;

    let discount = referrals.discount_for_player(auth.player_id).await?;

    Ok(Json(PlayerProfile {
        id: player.id,
        name: player.name,
        game_balance: player.game_balance,
        donate_balance: player.donate_balance,
        referral_code: player.referral_code,
        referrals_count: discount.referrals_count,
        discount_percent: discount.discount_percent,
        created_at: player.created_at,
    }))
}
