//! The purchase ledger: debit, discount, and record in one transaction.
//!
//! Everything financial about a purchase happens here, atomically. The
//! fulfillment pipeline runs strictly after this transaction commits and
//! can never unwind it.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::info;

use domain::models::Currency;
use domain::services::pricing::{resolve_price, PricingError};

use crate::entities::{ProductEntity, PromoCodeEntity, PurchaseEntity};
use crate::metrics::QueryTimer;

/// Failures of the financial leg of a purchase. All of them roll the
/// transaction back; no partial debit is ever visible.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("product not found or inactive")]
    ProductNotFound,

    #[error("purchase limit of {limit} reached for this product")]
    PurchaseLimitReached { limit: i32 },

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What the ledger hands to the fulfillment dispatcher after commit.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub purchase: PurchaseEntity,
    pub product: ProductEntity,
    pub base_price: i64,
    pub applied_discount_percent: i32,
}

/// Repository owning the purchase transaction.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Executes the financial leg of a purchase.
    ///
    /// Steps, all inside one transaction: load the active product, check
    /// the per-player cap, resolve discounts (locking the promo row),
    /// debit the balance with a guarded update, insert the purchase row,
    /// bump the purchase-count row. Commit happens before any remote
    /// command is attempted.
    pub async fn execute_purchase(
        &self,
        player_id: i64,
        player_name: &str,
        product_id: i64,
        currency: Currency,
        quantity: i32,
        promo_id: Option<i64>,
    ) -> Result<PurchaseOutcome, LedgerError> {
        let timer = QueryTimer::new("execute_purchase");
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, ProductEntity>(
            r#"
            SELECT id, name, description, kind, game_price, donate_price,
                   max_purchases_per_player, items, subscription_days,
                   execution_config, auto_execute, requires_manual_approval,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::ProductNotFound)?;

        let base_price = match currency {
            Currency::Game => product.game_price,
            Currency::Donate => product.donate_price,
        };

        if product.max_purchases_per_player > 0 {
            let made: Option<(i32,)> = sqlx::query_as(
                r#"
                SELECT purchases_made FROM purchase_limits
                WHERE player_id = $1 AND product_id = $2
                "#,
            )
            .bind(player_id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;

            if made.map_or(0, |m| m.0) >= product.max_purchases_per_player {
                return Err(LedgerError::PurchaseLimitReached {
                    limit: product.max_purchases_per_player,
                });
            }
        }

        let referral_discount: Option<(i32,)> = sqlx::query_as(
            r#"SELECT discount_percent FROM referral_discounts WHERE player_id = $1"#,
        )
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;
        let referral_discount = referral_discount.map_or(0, |r| r.0);

        // Lock the promo row for the rest of the transaction so two
        // concurrent purchases cannot both pass the uses_left check.
        let promo = match promo_id {
            Some(id) => Some(
                sqlx::query_as::<_, PromoCodeEntity>(
                    r#"
                    SELECT id, code, discount_percent, uses_left, starts_at, ends_at,
                           applicable_products, is_active, created_at
                    FROM promo_codes
                    WHERE id = $1
                    FOR UPDATE
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(PricingError::PromoInvalid)?
                .into_model(),
            ),
            None => None,
        };

        let resolved = resolve_price(
            base_price,
            referral_discount,
            promo.as_ref(),
            product_id,
            Utc::now(),
        )?;

        if resolved.promo_consumed {
            if let Some(promo) = &promo {
                consume_promo_use(&mut tx, promo.id).await?;
            }
        }

        let charge = resolved.final_price * quantity as i64;

        debit_balance(&mut tx, player_id, currency, charge).await?;

        let purchase = sqlx::query_as::<_, PurchaseEntity>(
            r#"
            INSERT INTO purchases (
                player_id, player_name, product_id, quantity, currency,
                amount_charged, discount_percent, promo_code_id, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
            RETURNING id, player_id, player_name, product_id, quantity, currency,
                      amount_charged, discount_percent, promo_code_id, status, purchased_at
            "#,
        )
        .bind(player_id)
        .bind(player_name)
        .bind(product_id)
        .bind(quantity)
        .bind(currency.as_str())
        .bind(charge)
        .bind(resolved.applied_discount_percent)
        .bind(promo.as_ref().map(|p| p.id))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_limits (player_id, product_id, purchases_made, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (player_id, product_id)
            DO UPDATE SET purchases_made = purchase_limits.purchases_made + 1, updated_at = NOW()
            "#,
        )
        .bind(player_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        info!(
            player = player_name,
            product_id,
            purchase_id = purchase.id,
            charge,
            discount = resolved.applied_discount_percent,
            currency = %currency,
            "Purchase committed"
        );

        Ok(PurchaseOutcome {
            purchase,
            product,
            base_price: base_price.unwrap_or(0),
            applied_discount_percent: resolved.applied_discount_percent,
        })
    }
}

/// Spends one promo use. The row is already locked, but the guard keeps
/// the counter from ever going negative regardless.
async fn consume_promo_use(
    tx: &mut Transaction<'_, Postgres>,
    promo_id: i64,
) -> Result<(), LedgerError> {
    // Unlimited codes have uses_left NULL and match zero rows, which is
    // fine. A numbered code cannot reach zero between validation and
    // here; its row is locked.
    sqlx::query(
        r#"
        UPDATE promo_codes
        SET uses_left = uses_left - 1
        WHERE id = $1 AND uses_left IS NOT NULL AND uses_left > 0
        "#,
    )
    .bind(promo_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Debits the chosen balance in a single guarded statement so two
/// concurrent purchases cannot both pass a stale sufficient-funds check.
async fn debit_balance(
    tx: &mut Transaction<'_, Postgres>,
    player_id: i64,
    currency: Currency,
    charge: i64,
) -> Result<(), LedgerError> {
    let sql = match currency {
        Currency::Game => {
            r#"
            UPDATE players
            SET game_balance = game_balance - $2, updated_at = NOW()
            WHERE id = $1 AND game_balance >= $2
            "#
        }
        Currency::Donate => {
            r#"
            UPDATE players
            SET donate_balance = donate_balance - $2, updated_at = NOW()
            WHERE id = $1 AND donate_balance >= $2
            "#
        }
    };

    let result = sqlx::query(sql)
        .bind(player_id)
        .bind(charge)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        let available: Option<(i64,)> = match currency {
            Currency::Game => {
                sqlx::query_as(r#"SELECT game_balance FROM players WHERE id = $1"#)
                    .bind(player_id)
                    .fetch_optional(&mut **tx)
                    .await?
            }
            Currency::Donate => {
                sqlx::query_as(r#"SELECT donate_balance FROM players WHERE id = $1"#)
                    .bind(player_id)
                    .fetch_optional(&mut **tx)
                    .await?
            }
        };

        return Err(LedgerError::InsufficientFunds {
            required: charge,
            available: available.map_or(0, |a| a.0),
        });
    }

    Ok(())
}
