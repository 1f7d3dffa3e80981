//! Purchase domain model and payment currency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The two wallets a product can be paid from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Earned in-game currency.
    Game,
    /// Purchased premium currency.
    Donate,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Game => "game",
            Currency::Donate => "donate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "game" => Some(Currency::Game),
            "donate" => Some(Currency::Donate),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of a completed payment.
///
/// The financial leg is final at commit time; fulfillment outcome is
/// tracked separately in the execution record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub product_id: i64,
    pub quantity: i32,
    pub currency: Currency,
    /// Amount actually debited, after discounts.
    pub amount_charged: i64,
    pub discount_percent: i32,
    pub promo_code_id: Option<i64>,
    pub status: String,
    pub purchased_at: DateTime<Utc>,
}

/// Request payload for a purchase.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub product_id: i64,

    pub payment_currency: Currency,

    /// 1..=64, one stack at most.
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 64))]
    pub quantity: i32,

    pub promocode_id: Option<i64>,
}

fn default_quantity() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("game"), Some(Currency::Game));
        assert_eq!(Currency::parse("donate"), Some(Currency::Donate));
        assert_eq!(Currency::parse("euro"), None);
        assert_eq!(Currency::parse("GAME"), None);
    }

    #[test]
    fn test_currency_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Currency::Game).unwrap(), "\"game\"");
        let parsed: Currency = serde_json::from_str("\"donate\"").unwrap();
        assert_eq!(parsed, Currency::Donate);
    }

    #[test]
    fn test_purchase_request_defaults_quantity() {
        let req: PurchaseRequest =
            serde_json::from_str(r#"{"productId": 5, "paymentCurrency": "game"}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert!(req.promocode_id.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_purchase_request_rejects_zero_quantity() {
        let req: PurchaseRequest = serde_json::from_str(
            r#"{"productId": 5, "paymentCurrency": "game", "quantity": 0}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }
}
