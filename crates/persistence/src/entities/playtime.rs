//! Playtime reward entity definitions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Aggregated lifetime active minutes per player, from session rows.
#[derive(Debug, Clone, FromRow)]
pub struct PlaytimeTotalRow {
    pub player_id: i64,
    pub player_name: String,
    pub total_active_minutes: i64,
}

/// Database entity for the playtime_rewards watermark table.
#[derive(Debug, Clone, FromRow)]
pub struct PlaytimeRewardEntity {
    pub player_id: i64,
    pub total_active_minutes: i64,
    pub coins_awarded: i64,
    pub last_awarded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
