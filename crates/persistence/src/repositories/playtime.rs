//! Playtime reward repository.
//!
//! Session rows are written by the game-server playtime plugin; this
//! repository aggregates them into active minutes and maintains the
//! per-player award watermark.

use sqlx::PgPool;

use crate::entities::{PlaytimeRewardEntity, PlaytimeTotalRow};
use crate::metrics::QueryTimer;

/// Repository for playtime accrual state.
#[derive(Clone)]
pub struct PlaytimeRepository {
    pool: PgPool,
}

impl PlaytimeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lifetime active minutes per player (session time minus AFK),
    /// players with at least one counted minute only.
    pub async fn active_minute_totals(&self) -> Result<Vec<PlaytimeTotalRow>, sqlx::Error> {
        let timer = QueryTimer::new("playtime_totals");

        let result = sqlx::query_as::<_, PlaytimeTotalRow>(
            r#"
            SELECT p.id AS player_id,
                   p.name AS player_name,
                   (COALESCE(SUM(GREATEST(0, s.session_end - s.session_start - s.afk_millis)), 0)
                       / 60000)::bigint AS total_active_minutes
            FROM players p
            JOIN playtime_sessions s ON s.player_id = p.id
            GROUP BY p.id, p.name
            HAVING COALESCE(SUM(GREATEST(0, s.session_end - s.session_start - s.afk_millis)), 0)
                       / 60000 >= 1
            ORDER BY total_active_minutes DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// The award watermark for a player, if any run has touched them.
    pub async fn watermark(
        &self,
        player_id: i64,
    ) -> Result<Option<PlaytimeRewardEntity>, sqlx::Error> {
        let timer = QueryTimer::new("playtime_watermark");

        let result = sqlx::query_as::<_, PlaytimeRewardEntity>(
            r#"
            SELECT player_id, total_active_minutes, coins_awarded, last_awarded_at, updated_at
            FROM playtime_rewards
            WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Credits `coins` for `new_minutes` of fresh activity and advances
    /// the watermark to `total_minutes`, in one transaction.
    pub async fn award(
        &self,
        player_id: i64,
        total_minutes: i64,
        new_minutes: i64,
        coins: i64,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("playtime_award");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO playtime_rewards
                (player_id, total_active_minutes, coins_awarded, last_awarded_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (player_id)
            DO UPDATE SET total_active_minutes = $2,
                          coins_awarded = playtime_rewards.coins_awarded + $3,
                          last_awarded_at = NOW(),
                          updated_at = NOW()
            "#,
        )
        .bind(player_id)
        .bind(total_minutes)
        .bind(coins)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE players
            SET game_balance = game_balance + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(player_id)
        .bind(coins)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        tracing::debug!(player_id, new_minutes, coins, "Playtime reward credited");
        Ok(())
    }
}
