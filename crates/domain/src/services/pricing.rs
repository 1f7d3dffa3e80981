//! Price and discount resolution.
//!
//! Discounts never stack: the applied discount is the larger of the
//! player's referral discount and the promo discount. Rounding always
//! favors the seller (ceiling), so a 10% discount on 95 charges 86, not 85.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::promo_code::PromoCode;

/// Pricing failures surfaced to the purchase flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("product has no price for the requested currency")]
    NoPriceForCurrency,

    #[error("promo code is invalid, expired, or exhausted")]
    PromoInvalid,

    #[error("promo code does not apply to this product")]
    PromoNotApplicable,
}

/// The outcome of a price resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    /// Price per unit after the applied discount.
    pub final_price: i64,
    /// The discount that actually applied (max of referral/promo).
    pub applied_discount_percent: i32,
    /// Whether a supplied promo passed validation and must be consumed.
    /// True even when the referral discount ends up winning.
    pub promo_consumed: bool,
}

/// Integer ceiling of `base * percent / 100`.
pub fn ceil_percent(base: i64, percent: i32) -> i64 {
    (base * percent as i64 + 99) / 100
}

/// Price after applying `discount_percent`, rounded up.
pub fn discounted_price(base: i64, discount_percent: i32) -> i64 {
    ceil_percent(base, 100 - discount_percent)
}

/// Validates a promo code against a product at `now`.
pub fn validate_promo(
    promo: &PromoCode,
    product_id: i64,
    now: DateTime<Utc>,
) -> Result<(), PricingError> {
    if !promo.is_usable(now) {
        return Err(PricingError::PromoInvalid);
    }
    if !promo.applies_to(product_id) {
        return Err(PricingError::PromoNotApplicable);
    }
    Ok(())
}

/// Resolves the final unit price for a purchase.
///
/// `base_price` is the product's price in the chosen currency (the caller
/// maps `None` to `NoPriceForCurrency` before this point or passes it
/// through here). A valid supplied promo is marked consumed regardless of
/// whether its discount wins over the referral discount; this mirrors the
/// established promo semantics of the shop.
pub fn resolve_price(
    base_price: Option<i64>,
    referral_discount_percent: i32,
    promo: Option<&PromoCode>,
    product_id: i64,
    now: DateTime<Utc>,
) -> Result<ResolvedPrice, PricingError> {
    let base = base_price.ok_or(PricingError::NoPriceForCurrency)?;

    let mut applied = referral_discount_percent.max(0);
    let mut promo_consumed = false;

    if let Some(promo) = promo {
        validate_promo(promo, product_id, now)?;
        applied = applied.max(promo.discount_percent);
        promo_consumed = true;
    }

    let final_price = if applied > 0 {
        discounted_price(base, applied)
    } else {
        base
    };

    Ok(ResolvedPrice {
        final_price,
        applied_discount_percent: applied,
        promo_consumed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(discount: i32) -> PromoCode {
        PromoCode {
            id: 7,
            code: "TEST".to_string(),
            discount_percent: discount,
            uses_left: Some(1),
            starts_at: None,
            ends_at: None,
            applicable_products: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ceil_percent() {
        assert_eq!(ceil_percent(100, 15), 15);
        assert_eq!(ceil_percent(10, 15), 2); // 1.5 rounds up
        assert_eq!(ceil_percent(1, 1), 1); // 0.01 rounds up
        assert_eq!(ceil_percent(0, 50), 0);
    }

    #[test]
    fn test_discounted_price_rounds_up() {
        // ceil(95 * 0.9) = 86
        assert_eq!(discounted_price(95, 10), 86);
        // ceil(100 * 0.9) = 90
        assert_eq!(discounted_price(100, 10), 90);
        assert_eq!(discounted_price(100, 0), 100);
        assert_eq!(discounted_price(100, 100), 0);
    }

    #[test]
    fn test_referral_discount_only() {
        // gamePrice=100, referral 10%, no promo -> 90
        let resolved = resolve_price(Some(100), 10, None, 1, Utc::now()).unwrap();
        assert_eq!(resolved.final_price, 90);
        assert_eq!(resolved.applied_discount_percent, 10);
        assert!(!resolved.promo_consumed);
    }

    #[test]
    fn test_promo_wins_over_referral() {
        // promo 20% vs referral 10% -> 20 applies, promo consumed
        let p = promo(20);
        let resolved = resolve_price(Some(100), 10, Some(&p), 1, Utc::now()).unwrap();
        assert_eq!(resolved.applied_discount_percent, 20);
        assert_eq!(resolved.final_price, 80);
        assert!(resolved.promo_consumed);
    }

    #[test]
    fn test_promo_consumed_even_when_referral_wins() {
        // Referral 30% beats promo 10%, but the promo use is still spent.
        let p = promo(10);
        let resolved = resolve_price(Some(100), 30, Some(&p), 1, Utc::now()).unwrap();
        assert_eq!(resolved.applied_discount_percent, 30);
        assert_eq!(resolved.final_price, 70);
        assert!(resolved.promo_consumed);
    }

    #[test]
    fn test_no_price_for_currency() {
        assert_eq!(
            resolve_price(None, 0, None, 1, Utc::now()),
            Err(PricingError::NoPriceForCurrency)
        );
    }

    #[test]
    fn test_exhausted_promo_rejected() {
        let mut p = promo(20);
        p.uses_left = Some(0);
        assert_eq!(
            resolve_price(Some(100), 0, Some(&p), 1, Utc::now()),
            Err(PricingError::PromoInvalid)
        );
    }

    #[test]
    fn test_expired_promo_rejected() {
        let mut p = promo(20);
        p.ends_at = Some(Utc::now() - Duration::hours(1));
        assert_eq!(
            resolve_price(Some(100), 0, Some(&p), 1, Utc::now()),
            Err(PricingError::PromoInvalid)
        );
    }

    #[test]
    fn test_promo_allowlist_enforced() {
        let mut p = promo(20);
        p.applicable_products = Some(vec![2, 3]);
        assert_eq!(
            resolve_price(Some(100), 0, Some(&p), 1, Utc::now()),
            Err(PricingError::PromoNotApplicable)
        );
        assert!(resolve_price(Some(100), 0, Some(&p), 2, Utc::now()).is_ok());
    }

    #[test]
    fn test_discounts_never_stack() {
        // 10% referral + 10% promo applies 10%, not 20%.
        let p = promo(10);
        let resolved = resolve_price(Some(100), 10, Some(&p), 1, Utc::now()).unwrap();
        assert_eq!(resolved.applied_discount_percent, 10);
        assert_eq!(resolved.final_price, 90);
    }
}
