//! Peer-to-peer currency transfer model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Commission taken from the sender, in percent of the amount.
pub const TRANSFER_COMMISSION_PERCENT: i32 = 15;

/// Minimum transferable amount.
pub const MIN_TRANSFER_AMOUNT: i64 = 10;

/// A completed game-currency transfer between two players.
///
/// Structurally parallel to a purchase but with no fulfillment step; the
/// commission is deducted from the sender on top of the amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
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

/// Request payload for a transfer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Exact-case recipient name.
    pub recipient_name: String,

    /// Must be at least `MIN_TRANSFER_AMOUNT`.
    #[validate(range(min = 10, message = "Amount below the minimum"))]
    pub amount: i64,

    #[validate(length(max = 200))]
    pub message: Option<String>,
}

/// Commission breakdown for a prospective transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuote {
    pub amount: i64,
    pub commission: i64,
    pub total_deduction: i64,
    pub commission_percent: i32,
    pub min_transfer_amount: i64,
}

impl TransferQuote {
    /// Computes the sender-side cost of transferring `amount`.
    pub fn for_amount(amount: i64) -> Self {
        let commission = crate::services::pricing::ceil_percent(amount, TRANSFER_COMMISSION_PERCENT);
        Self {
            amount,
            commission,
            total_deduction: amount + commission,
            commission_percent: TRANSFER_COMMISSION_PERCENT,
            min_transfer_amount: MIN_TRANSFER_AMOUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_rounds_commission_up() {
        // 15% of 10 = 1.5, charged as 2.
        let quote = TransferQuote::for_amount(10);
        assert_eq!(quote.commission, 2);
        assert_eq!(quote.total_deduction, 12);
    }

    #[test]
    fn test_quote_exact_percentage() {
        let quote = TransferQuote::for_amount(100);
        assert_eq!(quote.commission, 15);
        assert_eq!(quote.total_deduction, 115);
    }

    #[test]
    fn test_request_minimum_amount() {
        let ok = TransferRequest {
            recipient_name: "Alex".to_string(),
            amount: MIN_TRANSFER_AMOUNT,
            message: None,
        };
        assert!(ok.validate().is_ok());

        let too_small = TransferRequest {
            recipient_name: "Alex".to_string(),
            amount: MIN_TRANSFER_AMOUNT - 1,
            message: None,
        };
        assert!(too_small.validate().is_err());
    }
}
