//! Purchase history repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::PurchaseEntity;
use crate::metrics::QueryTimer;

const PURCHASE_COLUMNS: &str = "id, player_id, player_name, product_id, quantity, currency, \
                                amount_charged, discount_percent, promo_code_id, status, \
                                purchased_at";

/// Shop-wide purchase statistics (admin view).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseStats {
    pub total_purchases: Option<i64>,
    pub game_revenue: Option<i64>,
    pub donate_revenue: Option<i64>,
    pub unique_buyers: Option<i64>,
}

/// Repository for reading committed purchases.
#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PurchaseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_purchase_by_id");

        let result = sqlx::query_as::<_, PurchaseEntity>(&format!(
            r#"SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// A player's purchase history, newest first, cursor-paginated on
    /// (purchased_at, id).
    pub async fn history_for_player(
        &self,
        player_id: i64,
        before: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<Vec<PurchaseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("purchase_history");

        let result = sqlx::query_as::<_, PurchaseEntity>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases
            WHERE player_id = $1
              AND ($2::timestamptz IS NULL OR (purchased_at, id) < ($2, $3))
            ORDER BY purchased_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(player_id)
        .bind(before.map(|(ts, _)| ts))
        .bind(before.map(|(_, id)| id).unwrap_or(0))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Aggregate statistics over completed purchases since `since`
    /// (`None` = all time).
    pub async fn stats(&self, since: Option<DateTime<Utc>>) -> Result<PurchaseStats, sqlx::Error> {
        let timer = QueryTimer::new("purchase_stats");

        let result = sqlx::query_as::<_, PurchaseStats>(
            r#"
            SELECT
                COUNT(*) AS total_purchases,
                COALESCE(SUM(amount_charged) FILTER (WHERE currency = 'game'), 0) AS game_revenue,
                COALESCE(SUM(amount_charged) FILTER (WHERE currency = 'donate'), 0) AS donate_revenue,
                COUNT(DISTINCT player_id) AS unique_buyers
            FROM purchases
            WHERE status = 'completed'
              AND ($1::timestamptz IS NULL OR purchased_at >= $1)
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }
}
