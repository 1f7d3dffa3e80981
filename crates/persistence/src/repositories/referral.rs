//! Referral tracking repository.

use sqlx::PgPool;
use tracing::info;

use domain::services::referral::discount_for_referrals;

use crate::metrics::QueryTimer;

/// A referrer's discount state.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ReferralDiscountRow {
    pub referrals_count: i32,
    pub discount_percent: i32,
}

/// Repository for referral confirmations and the derived discount.
#[derive(Clone)]
pub struct ReferralRepository {
    pool: PgPool,
}

impl ReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Confirms a referral and bumps the referrer's discount, in one
    /// transaction. The referred player can only ever be confirmed once
    /// (unique constraint on referred_id).
    pub async fn confirm_referral(
        &self,
        referrer_id: i64,
        referred_id: i64,
        referred_name: &str,
    ) -> Result<ReferralDiscountRow, sqlx::Error> {
        let timer = QueryTimer::new("confirm_referral");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO referrals (referrer_id, referred_id, referred_name, confirmed)
            VALUES ($1, $2, $3, TRUE)
            "#,
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(referred_name)
        .execute(&mut *tx)
        .await?;

        let count: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO referral_discounts (player_id, referrals_count, discount_percent, updated_at)
            VALUES ($1, 1, 2, NOW())
            ON CONFLICT (player_id)
            DO UPDATE SET referrals_count = referral_discounts.referrals_count + 1, updated_at = NOW()
            RETURNING referrals_count
            "#,
        )
        .bind(referrer_id)
        .fetch_one(&mut *tx)
        .await?;

        let discount_percent = discount_for_referrals(count.0);

        sqlx::query(
            r#"UPDATE referral_discounts SET discount_percent = $2 WHERE player_id = $1"#,
        )
        .bind(referrer_id)
        .bind(discount_percent)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        info!(
            referrer_id,
            referred = referred_name,
            referrals = count.0,
            discount_percent,
            "Referral confirmed"
        );

        Ok(ReferralDiscountRow {
            referrals_count: count.0,
            discount_percent,
        })
    }

    /// The player's current discount state, zeroes when never referred.
    pub async fn discount_for_player(
        &self,
        player_id: i64,
    ) -> Result<ReferralDiscountRow, sqlx::Error> {
        let timer = QueryTimer::new("referral_discount_for_player");

        let row: Option<ReferralDiscountRow> = sqlx::query_as(
            r#"
            SELECT referrals_count, discount_percent
            FROM referral_discounts
            WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(row.unwrap_or(ReferralDiscountRow {
            referrals_count: 0,
            discount_percent: 0,
        }))
    }
}
