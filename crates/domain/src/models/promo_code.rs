//! Promo code model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A redeemable discount code.
///
/// `uses_left = None` means unlimited; a numbered counter is decremented
/// atomically at purchase time and never resurrected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: i64,
    pub code: String,
    pub discount_percent: i32,
    pub uses_left: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Product ids this code applies to; `None` = all products.
    pub applicable_products: Option<Vec<i64>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Whether the code is usable at `now`, ignoring product applicability.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |s| s <= now)
            && self.ends_at.map_or(true, |e| e >= now)
            && self.uses_left.map_or(true, |u| u > 0)
    }

    /// Whether the code covers the given product.
    pub fn applies_to(&self, product_id: i64) -> bool {
        self.applicable_products
            .as_ref()
            .map_or(true, |ids| ids.contains(&product_id))
    }
}

/// Request payload for creating a promo code (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoCodeRequest {
    #[validate(custom(function = "shared::validation::validate_promo_code"))]
    pub code: String,

    #[validate(range(min = 1, max = 100))]
    pub discount_percent: i32,

    #[validate(range(min = 1))]
    pub uses_left: Option<i32>,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    pub applicable_products: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo() -> PromoCode {
        PromoCode {
            id: 1,
            code: "WELCOME_10".to_string(),
            discount_percent: 10,
            uses_left: Some(5),
            starts_at: None,
            ends_at: None,
            applicable_products: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_usable_when_active_and_in_window() {
        assert!(promo().is_usable(Utc::now()));
    }

    #[test]
    fn test_not_usable_when_inactive() {
        let mut p = promo();
        p.is_active = false;
        assert!(!p.is_usable(Utc::now()));
    }

    #[test]
    fn test_not_usable_before_window() {
        let mut p = promo();
        p.starts_at = Some(Utc::now() + Duration::hours(1));
        assert!(!p.is_usable(Utc::now()));
    }

    #[test]
    fn test_not_usable_after_window() {
        let mut p = promo();
        p.ends_at = Some(Utc::now() - Duration::hours(1));
        assert!(!p.is_usable(Utc::now()));
    }

    #[test]
    fn test_not_usable_when_exhausted() {
        let mut p = promo();
        p.uses_left = Some(0);
        assert!(!p.is_usable(Utc::now()));
    }

    #[test]
    fn test_unlimited_uses() {
        let mut p = promo();
        p.uses_left = None;
        assert!(p.is_usable(Utc::now()));
    }

    #[test]
    fn test_applies_to_allowlist() {
        let mut p = promo();
        assert!(p.applies_to(99));

        p.applicable_products = Some(vec![1, 2, 3]);
        assert!(p.applies_to(2));
        assert!(!p.applies_to(99));
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreatePromoCodeRequest {
            code: "SUMMER-2026".to_string(),
            discount_percent: 25,
            uses_left: Some(100),
            starts_at: None,
            ends_at: None,
            applicable_products: None,
        };
        assert!(req.validate().is_ok());

        let bad = CreatePromoCodeRequest {
            discount_percent: 0,
            ..req
        };
        assert!(bad.validate().is_err());
    }
}
