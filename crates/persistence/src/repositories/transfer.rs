//! Peer-to-peer transfer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::entities::TransferEntity;
use crate::metrics::QueryTimer;

const TRANSFER_COLUMNS: &str = "id, sender_id, sender_name, recipient_id, recipient_name, \
                                amount, commission, total_deducted, message, status, created_at";

/// Which side of the history a player wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    All,
    Sent,
    Received,
}

/// Failures of the transfer transaction.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("recipient not found")]
    RecipientNotFound {
        /// Canonical spelling when only the case differed.
        suggestion: Option<String>,
    },

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A player's aggregate transfer statistics.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransferStats {
    pub sent_count: Option<i64>,
    pub sent_amount: Option<i64>,
    pub sent_commission: Option<i64>,
    pub received_count: Option<i64>,
    pub received_amount: Option<i64>,
}

/// Repository for game-currency transfers between players.
#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Moves `amount` from sender to recipient, charging the sender
    /// `amount + commission`, in one transaction.
    ///
    /// Recipient lookup is exact-case; on a miss, a case-insensitive probe
    /// provides a spelling suggestion for the error.
    pub async fn execute_transfer(
        &self,
        sender_id: i64,
        sender_name: &str,
        recipient_name: &str,
        amount: i64,
        commission: i64,
        message: Option<&str>,
    ) -> Result<TransferEntity, TransferError> {
        let timer = QueryTimer::new("execute_transfer");
        let mut tx = self.pool.begin().await?;

        let recipient: Option<(i64, String)> =
            sqlx::query_as(r#"SELECT id, name FROM players WHERE name = $1"#)
                .bind(recipient_name)
                .fetch_optional(&mut *tx)
                .await?;

        let (recipient_id, recipient_name) = match recipient {
            Some(r) => r,
            None => {
                let suggestion: Option<(String,)> = sqlx::query_as(
                    r#"SELECT name FROM players WHERE LOWER(name) = LOWER($1) LIMIT 1"#,
                )
                .bind(recipient_name)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(TransferError::RecipientNotFound {
                    suggestion: suggestion.map(|s| s.0),
                });
            }
        };

        let total = amount + commission;

        // Guarded debit; zero rows means the balance check failed.
        let debited = sqlx::query(
            r#"
            UPDATE players
            SET game_balance = game_balance - $2, updated_at = NOW()
            WHERE id = $1 AND game_balance >= $2
            "#,
        )
        .bind(sender_id)
        .bind(total)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            let available: Option<(i64,)> =
                sqlx::query_as(r#"SELECT game_balance FROM players WHERE id = $1"#)
                    .bind(sender_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(TransferError::InsufficientFunds {
                required: total,
                available: available.map_or(0, |a| a.0),
            });
        }

        sqlx::query(
            r#"
            UPDATE players
            SET game_balance = game_balance + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(recipient_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let transfer = sqlx::query_as::<_, TransferEntity>(&format!(
            r#"
            INSERT INTO transfers (
                sender_id, sender_name, recipient_id, recipient_name,
                amount, commission, total_deducted, message, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(sender_id)
        .bind(sender_name)
        .bind(recipient_id)
        .bind(&recipient_name)
        .bind(amount)
        .bind(commission)
        .bind(total)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        info!(
            sender = sender_name,
            recipient = %recipient_name,
            amount,
            commission,
            "Transfer completed"
        );

        Ok(transfer)
    }

    /// A player's transfer history, newest first, cursor-paginated.
    pub async fn history_for_player(
        &self,
        player_id: i64,
        direction: TransferDirection,
        before: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<Vec<TransferEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transfer_history");

        let direction_clause = match direction {
            TransferDirection::All => "(sender_id = $1 OR recipient_id = $1)",
            TransferDirection::Sent => "sender_id = $1",
            TransferDirection::Received => "recipient_id = $1",
        };

        let result = sqlx::query_as::<_, TransferEntity>(&format!(
            r#"
            SELECT {TRANSFER_COLUMNS}
            FROM transfers
            WHERE {direction_clause}
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
            ORDER BY created_at DESC, id DESC
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

    pub async fn stats_for_player(&self, player_id: i64) -> Result<TransferStats, sqlx::Error> {
        let timer = QueryTimer::new("transfer_stats");

        let result = sqlx::query_as::<_, TransferStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE sender_id = $1) AS sent_count,
                COALESCE(SUM(amount) FILTER (WHERE sender_id = $1), 0) AS sent_amount,
                COALESCE(SUM(commission) FILTER (WHERE sender_id = $1), 0) AS sent_commission,
                COUNT(*) FILTER (WHERE recipient_id = $1) AS received_count,
                COALESCE(SUM(amount) FILTER (WHERE recipient_id = $1), 0) AS received_amount
            FROM transfers
            WHERE (sender_id = $1 OR recipient_id = $1) AND status = 'completed'
            "#,
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }
}
