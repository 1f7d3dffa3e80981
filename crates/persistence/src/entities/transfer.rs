//! Transfer entity definition.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Transfer;

/// Database entity for the transfers table.
#[derive(Debug, Clone, FromRow)]
pub struct TransferEntity {
    pub id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub recipient_id: i64,
    pub recipient_name: String,
    pub amount: i64,
    pub commission: i64,
    pub total_deducted: i64,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TransferEntity {
    pub fn into_model(self) -> Transfer {
        Transfer {
            id: self.id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            recipient_id: self.recipient_id,
            recipient_name: self.recipient_name,
            amount: self.amount,
            commission: self.commission,
            total_deducted: self.total_deducted,
            message: self.message,
            status: self.status,
            created_at: self.created_at,
        }
    }
}
