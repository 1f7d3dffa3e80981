//! Player entity definition.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Player;

/// Database entity for the players table.
#[derive(Debug, Clone, FromRow)]
pub struct PlayerEntity {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
    pub game_balance: i64,
    pub donate_balance: i64,
    pub referral_code: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerEntity {
    /// Converts to the domain model, dropping the password hash.
    pub fn into_model(self) -> Player {
        Player {
            id: self.id,
            name: self.name,
            game_balance: self.game_balance,
            donate_balance: self.donate_balance,
            referral_code: self.referral_code,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
