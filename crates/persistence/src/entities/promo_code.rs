//! Promo code entity definition.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::PromoCode;

/// Database entity for the promo_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct PromoCodeEntity {
    pub id: i64,
    pub code: String,
    pub discount_percent: i32,
    pub uses_left: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub applicable_products: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PromoCodeEntity {
    pub fn into_model(self) -> PromoCode {
        let applicable_products = self
            .applicable_products
            .as_ref()
            .and_then(|v| serde_json::from_value::<Vec<i64>>(v.clone()).ok());

        PromoCode {
            id: self.id,
            code: self.code,
            discount_percent: self.discount_percent,
            uses_left: self.uses_left,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            applicable_products,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}
