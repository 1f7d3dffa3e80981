//! Execution record repository.
//!
//! Provides the durable trail for the fulfillment dispatcher and the
//! retry sweeper. Records are created pending before any remote command
//! is attempted, so a crash mid-dispatch still leaves a recoverable row.

use sqlx::PgPool;

use domain::models::execution::status_after_attempt;

use crate::entities::{ExecutionEntity, RetryableExecutionRow};
use crate::metrics::QueryTimer;

const EXECUTION_COLUMNS: &str = "id, purchase_id, player_id, product_id, kind, status, \
                                 commands, result, retry_count, max_retries, created_at, \
                                 executed_at";

/// Per-kind, per-status execution counts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExecutionStatRow {
    pub kind: String,
    pub status: String,
    pub count: Option<i64>,
}

/// Repository for fulfillment execution records.
#[derive(Clone)]
pub struct ExecutionRepository {
    pool: PgPool,
}

impl ExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a pending record for a fresh purchase.
    pub async fn create_pending(
        &self,
        purchase_id: i64,
        player_id: i64,
        product_id: i64,
        kind: &str,
        max_retries: i32,
    ) -> Result<ExecutionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_execution");

        let result = sqlx::query_as::<_, ExecutionEntity>(&format!(
            r#"
            INSERT INTO product_executions (purchase_id, player_id, product_id, kind, status, max_retries)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(purchase_id)
        .bind(player_id)
        .bind(product_id)
        .bind(kind)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Routes a record to manual handling. Terminal for automation; the
    /// sweeper never picks these up.
    pub async fn mark_manual(&self, id: i64) -> Result<ExecutionEntity, sqlx::Error> {
        let timer = QueryTimer::new("mark_execution_manual");

        let result = sqlx::query_as::<_, ExecutionEntity>(&format!(
            r#"
            UPDATE product_executions
            SET status = 'manual_required'
            WHERE id = $1
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Records the outcome of one attempt.
    ///
    /// The status transition follows the execution state machine: success
    /// is terminal; failure bumps the retry counter and goes terminal
    /// `failed` once the budget is spent, otherwise stays pending for the
    /// sweeper.
    pub async fn record_attempt(
        &self,
        id: i64,
        commands: &serde_json::Value,
        results: &serde_json::Value,
        all_succeeded: bool,
    ) -> Result<ExecutionEntity, sqlx::Error> {
        let timer = QueryTimer::new("record_execution_attempt");

        let current: (i32, i32) = sqlx::query_as(
            r#"SELECT retry_count, max_retries FROM product_executions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let (retry_count, max_retries) = current;
        let new_retry_count = if all_succeeded {
            retry_count
        } else {
            retry_count + 1
        };
        let new_status = status_after_attempt(all_succeeded, new_retry_count, max_retries);

        let result = sqlx::query_as::<_, ExecutionEntity>(&format!(
            r#"
            UPDATE product_executions
            SET status = $2,
                commands = $3,
                result = $4,
                retry_count = $5,
                executed_at = CASE WHEN $6 THEN NOW() ELSE executed_at END
            WHERE id = $1
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_status.as_str())
        .bind(commands)
        .bind(results)
        .bind(new_retry_count)
        .bind(all_succeeded)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Records pending with retry budget left, oldest first, joined with
    /// the product configuration and purchase context the sweeper needs.
    pub async fn find_retryable(
        &self,
        limit: i64,
    ) -> Result<Vec<RetryableExecutionRow>, sqlx::Error> {
        let timer = QueryTimer::new("find_retryable_executions");

        let result = sqlx::query_as::<_, RetryableExecutionRow>(
            r#"
            SELECT pe.id, pe.purchase_id, pe.player_id, pe.product_id, pe.kind,
                   pe.retry_count, pe.max_retries,
                   pu.quantity,
                   pl.name AS player_name,
                   pr.kind AS product_kind, pr.items, pr.subscription_days, pr.execution_config
            FROM product_executions pe
            JOIN purchases pu ON pu.id = pe.purchase_id
            JOIN players pl ON pl.id = pe.player_id
            JOIN products pr ON pr.id = pe.product_id
            WHERE pe.status = 'pending'
              AND pe.retry_count < pe.max_retries
            ORDER BY pe.created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn find_by_purchase(
        &self,
        purchase_id: i64,
    ) -> Result<Vec<ExecutionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_executions_by_purchase");

        let result = sqlx::query_as::<_, ExecutionEntity>(&format!(
            r#"
            SELECT {EXECUTION_COLUMNS}
            FROM product_executions
            WHERE purchase_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Execution counts grouped by kind and status (admin statistics).
    pub async fn stats(&self) -> Result<Vec<ExecutionStatRow>, sqlx::Error> {
        let timer = QueryTimer::new("execution_stats");

        let result = sqlx::query_as::<_, ExecutionStatRow>(
            r#"
            SELECT kind, status, COUNT(*) AS count
            FROM product_executions
            GROUP BY kind, status
            ORDER BY kind, status
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }
}
