//! Shop endpoint handlers.
//!
//! The purchase endpoint is deliberately synchronous about fulfillment:
//! it awaits the dispatcher and returns the remote results inline. The
//! financial outcome is decided first and is never affected by what the
//! dispatcher does afterwards.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::execution::{CommandResult, ExecutionStatus};
use domain::models::purchase::{Purchase, PurchaseRequest};
use persistence::entities::ExecutionEntity;
use persistence::repositories::{
    ExecutionRepository, LedgerRepository, PurchaseRepository,
};
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::PlayerAuth;
use crate::middleware::metrics::{record_fulfillment_outcome, record_purchase_completed};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base: i64,
    pub r#final: i64,
    pub currency: String,
    pub discount_percent: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: PriceBreakdown,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: i64,
    pub status: String,
    pub auto_executed: bool,
    pub requires_manual_action: bool,
    pub retry_count: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<CommandResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub purchase: PurchaseSummary,
    /// Absent only if recording the fulfillment attempt itself failed;
    /// the execution record is then still queryable by purchase id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionSummary>,
}

/// Buy a product.
///
/// POST /api/v1/shop/purchase
pub async fn purchase(
    State(state): State<AppState>,
    auth: PlayerAuth,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    request.validate()?;

    let ledger = LedgerRepository::new(state.pool.clone());
    let outcome = ledger
        .execute_purchase(
            auth.player_id,
            &auth.name,
            request.product_id,
            request.payment_currency,
            request.quantity,
            request.promocode_id,
        )
        .await?;

    record_purchase_completed(
        request.payment_currency.as_str(),
        outcome.purchase.amount_charged,
    );

    // The money is committed; fulfillment runs as a separate step and its
    // failure must never surface as a purchase failure.
    let execution = match state
        .fulfillment
        .dispatch(&outcome.purchase, &outcome.product)
        .await
    {
        Ok(report) => {
            if let Some(status) = report.status() {
                record_fulfillment_outcome(status.as_str());
            }
            Some(ExecutionSummary {
                id: report.execution.id,
                status: report.execution.status.clone(),
                auto_executed: report.auto_executed,
                requires_manual_action: report.status()
                    == Some(ExecutionStatus::ManualRequired),
                retry_count: report.execution.retry_count,
                results: report.results,
            })
        }
        Err(e) => {
            tracing::error!(
                purchase_id = outcome.purchase.id,
                error = %e,
                "Fulfillment dispatch failed after committed purchase"
            );
            None
        }
    };

    Ok(Json(PurchaseResponse {
        purchase: PurchaseSummary {
            id: outcome.purchase.id,
            product_id: outcome.product.id,
            product_name: outcome.product.name.clone(),
            quantity: outcome.purchase.quantity,
            price: PriceBreakdown {
                base: outcome.base_price,
                r#final: outcome.purchase.amount_charged,
                currency: outcome.purchase.currency.clone(),
                discount_percent: outcome.applied_discount_percent,
            },
            purchased_at: outcome.purchase.purchased_at,
        },
        execution,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub purchases: Vec<Purchase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// The player's purchase history, newest first.
///
/// GET /api/v1/shop/history
pub async fn purchase_history(
    State(state): State<AppState>,
    auth: PlayerAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let repo = PurchaseRepository::new(state.pool.clone());

    let before = match query.cursor.as_deref() {
        Some(cursor) => {
            Some(decode_cursor(cursor).map_err(|e| ApiError::Validation(e.to_string()))?)
        }
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let entities = repo.history_for_player(auth.player_id, before, limit).await?;

    let next_cursor = if entities.len() as i64 == limit {
        entities
            .last()
            .map(|p| encode_cursor(p.purchased_at, p.id))
    } else {
        None
    };

    let purchases = entities.into_iter().filter_map(|e| e.into_model()).collect();

    Ok(Json(HistoryResponse {
        purchases,
        next_cursor,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetail {
    pub id: i64,
    pub kind: String,
    pub status: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub results: Option<Vec<CommandResult>>,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl From<ExecutionEntity> for ExecutionDetail {
    fn from(entity: ExecutionEntity) -> Self {
        let results = entity.parsed_results();
        Self {
            id: entity.id,
            kind: entity.kind,
            status: entity.status,
            retry_count: entity.retry_count,
            max_retries: entity.max_retries,
            results,
            created_at: entity.created_at,
            executed_at: entity.executed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetailResponse {
    pub purchase: Purchase,
    pub executions: Vec<ExecutionDetail>,
}

/// One purchase with its fulfillment trail. Players see their own;
/// admins see any.
///
/// GET /api/v1/shop/purchases/:id
pub async fn purchase_details(
    State(state): State<AppState>,
    auth: PlayerAuth,
    Path(purchase_id): Path<i64>,
) -> Result<Json<PurchaseDetailResponse>, ApiError> {
    let purchases = PurchaseRepository::new(state.pool.clone());
    let executions = ExecutionRepository::new(state.pool.clone());

    let purchase = purchases
        .find_by_id(purchase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Purchase not found".into()))?;

    if purchase.player_id != auth.player_id && !auth.is_admin {
        // Do not leak existence of other players' purchases.
        return Err(ApiError::NotFound("Purchase not found".into()));
    }

    let executions = executions
        .find_by_purchase(purchase_id)
        .await?
        .into_iter()
        .map(ExecutionDetail::from)
        .collect();

    let purchase = purchase
        .into_model()
        .ok_or_else(|| ApiError::Internal("Stored purchase has unknown currency".into()))?;

    Ok(Json(PurchaseDetailResponse {
        purchase,
        executions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// One of 7d / 30d / 90d / all.
    pub period: Option<String>,
}

/// Shop statistics (admin).
///
/// GET /api/v1/admin/shop/stats
pub async fn shop_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let purchases = PurchaseRepository::new(state.pool.clone());
    let executions = ExecutionRepository::new(state.pool.clone());

    let period = query.period.as_deref().unwrap_or("7d");
    let since = match period {
        "7d" => Some(Utc::now() - Duration::days(7)),
        "30d" => Some(Utc::now() - Duration::days(30)),
        "90d" => Some(Utc::now() - Duration::days(90)),
        "all" => None,
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown period '{}', expected 7d/30d/90d/all",
                other
            )))
        }
    };

    let stats = purchases.stats(since).await?;
    let execution_stats = executions.stats().await?;

    let executions_json: Vec<serde_json::Value> = execution_stats
        .into_iter()
        .map(|row| {
            serde_json::json!({
                "kind": row.kind,
                "status": row.status,
                "count": row.count.unwrap_or(0),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "period": period,
        "totalPurchases": stats.total_purchases.unwrap_or(0),
        "gameRevenue": stats.game_revenue.unwrap_or(0),
        "donateRevenue": stats.donate_revenue.unwrap_or(0),
        "uniqueBuyers": stats.unique_buyers.unwrap_or(0),
        "executions": executions_json,
    })))
}
