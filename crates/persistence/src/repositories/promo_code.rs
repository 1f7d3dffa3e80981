//! Promo code repository.

use sqlx::PgPool;

use crate::entities::PromoCodeEntity;
use crate::metrics::QueryTimer;

const PROMO_COLUMNS: &str = "id, code, discount_percent, uses_left, starts_at, ends_at, \
                             applicable_products, is_active, created_at";

/// Input data for creating a promo code.
#[derive(Debug, Clone)]
pub struct PromoCodeInput {
    pub code: String,
    pub discount_percent: i32,
    pub uses_left: Option<i32>,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    pub applicable_products: Option<serde_json::Value>,
}

/// Repository for promo code operations.
#[derive(Clone)]
pub struct PromoCodeRepository {
    pool: PgPool,
}

impl PromoCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<PromoCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_promo_by_code");

        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = $1"#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn create(&self, input: PromoCodeInput) -> Result<PromoCodeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_promo");

        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            INSERT INTO promo_codes (
                code, discount_percent, uses_left, starts_at, ends_at, applicable_products
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROMO_COLUMNS}
            "#
        ))
        .bind(&input.code)
        .bind(input.discount_percent)
        .bind(input.uses_left)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(&input.applicable_products)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn list(
        &self,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PromoCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_promos");

        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            SELECT {PROMO_COLUMNS}
            FROM promo_codes
            WHERE (NOT $1 OR is_active)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn deactivate(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_promo");

        let result = sqlx::query(r#"UPDATE promo_codes SET is_active = FALSE WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
