//! Product repository.

use sqlx::PgPool;

use crate::entities::ProductEntity;
use crate::metrics::QueryTimer;

const PRODUCT_COLUMNS: &str = "id, name, description, kind, game_price, donate_price, \
                               max_purchases_per_player, items, subscription_days, \
                               execution_config, auto_execute, requires_manual_approval, \
                               is_active, created_at, updated_at";

/// Input data for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub game_price: Option<i64>,
    pub donate_price: Option<i64>,
    pub max_purchases_per_player: i32,
    pub items: Option<serde_json::Value>,
    pub subscription_days: Option<i32>,
    pub execution_config: serde_json::Value,
    pub auto_execute: bool,
    pub requires_manual_approval: bool,
}

/// Repository for catalog operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists products, newest first. `kind = None` lists all kinds;
    /// `active_only` hides soft-deleted entries.
    pub async fn list(
        &self,
        kind: Option<&str>,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_products");

        let result = sqlx::query_as::<_, ProductEntity>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR kind = $1)
              AND (NOT $2 OR is_active)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(kind)
        .bind(active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Active product by id (the shop-facing lookup).
    pub async fn find_active_by_id(&self, id: i64) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_product");

        let result = sqlx::query_as::<_, ProductEntity>(&format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Any product by id, including soft-deleted (admin views).
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_product_by_id");

        let result = sqlx::query_as::<_, ProductEntity>(&format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn create(&self, input: ProductInput) -> Result<ProductEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_product");

        let result = sqlx::query_as::<_, ProductEntity>(&format!(
            r#"
            INSERT INTO products (
                name, description, kind, game_price, donate_price,
                max_purchases_per_player, items, subscription_days,
                execution_config, auto_execute, requires_manual_approval
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.kind)
        .bind(input.game_price)
        .bind(input.donate_price)
        .bind(input.max_purchases_per_player)
        .bind(&input.items)
        .bind(input.subscription_days)
        .bind(&input.execution_config)
        .bind(input.auto_execute)
        .bind(input.requires_manual_approval)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_product");

        let result = sqlx::query_as::<_, ProductEntity>(&format!(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                kind = $4,
                game_price = $5,
                donate_price = $6,
                max_purchases_per_player = $7,
                items = $8,
                subscription_days = $9,
                execution_config = $10,
                auto_execute = $11,
                requires_manual_approval = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.kind)
        .bind(input.game_price)
        .bind(input.donate_price)
        .bind(input.max_purchases_per_player)
        .bind(&input.items)
        .bind(input.subscription_days)
        .bind(&input.execution_config)
        .bind(input.auto_execute)
        .bind(input.requires_manual_approval)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Soft delete: the product disappears from the shop but keeps its
    /// history rows intact.
    pub async fn deactivate(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_product");

        let result = sqlx::query(
            r#"UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
