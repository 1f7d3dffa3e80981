//! Player domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::validation::validate_player_name;

/// A registered community member with an in-game identity and two wallets.
///
/// Balances are only ever mutated through the purchase ledger, transfers,
/// or the reward jobs. Players are never deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    /// Canonical in-game name, unique and case-sensitive.
    pub name: String,
    pub game_balance: i64,
    pub donate_balance: i64,
    pub referral_code: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for player registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    /// Referral code of the player who invited this one, if any.
    pub referral_code: Option<String>,
}

/// Request payload for login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Request payload for token refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Issued token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Public profile view of a player, including the referral discount state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: i64,
    pub name: String,
    pub game_balance: i64,
    pub donate_balance: i64,
    pub referral_code: String,
    pub referrals_count: i32,
    pub discount_percent: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "Steve".to_string(),
            password: "longenough1".to_string(),
            referral_code: None,
        };
        assert!(ok.validate().is_ok());

        let bad_name = RegisterRequest {
            name: "no spaces".to_string(),
            password: "longenough1".to_string(),
            referral_code: None,
        };
        assert!(bad_name.validate().is_err());

        let short_password = RegisterRequest {
            name: "Steve".to_string(),
            password: "short".to_string(),
            referral_code: None,
        };
        assert!(short_password.validate().is_err());
    }
}
