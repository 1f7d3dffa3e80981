//! Purchase entity definition.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{Currency, Purchase};

/// Database entity for the purchases table.
#[derive(Debug, Clone, FromRow)]
pub struct PurchaseEntity {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub product_id: i64,
    pub quantity: i32,
    pub currency: String,
    pub amount_charged: i64,
    pub discount_percent: i32,
    pub promo_code_id: Option<i64>,
    pub status: String,
    pub purchased_at: DateTime<Utc>,
}

impl PurchaseEntity {
    pub fn into_model(self) -> Option<Purchase> {
        let currency = Currency::parse(&self.currency)?;
        Some(Purchase {
            id: self.id,
            player_id: self.player_id,
            player_name: self.player_name,
            product_id: self.product_id,
            quantity: self.quantity,
            currency,
            amount_charged: self.amount_charged,
            discount_percent: self.discount_percent,
            promo_code_id: self.promo_code_id,
            status: self.status,
            purchased_at: self.purchased_at,
        })
    }
}
