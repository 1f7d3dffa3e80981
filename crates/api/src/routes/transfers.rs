//! Transfer endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::transfer::{Transfer, TransferQuote, TransferRequest, MIN_TRANSFER_AMOUNT};
use persistence::repositories::transfer::TransferDirection;
use persistence::repositories::{PlayerRepository, TransferRepository};
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::PlayerAuth;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transfer: Transfer,
    pub new_balance: i64,
}

/// Send game currency to another player. The 15% commission is taken
/// from the sender on top of the amount.
///
/// POST /api/v1/transfers
pub async fn create_transfer(
    State(state): State<AppState>,
    auth: PlayerAuth,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    request.validate()?;

    if auth.name.eq_ignore_ascii_case(&request.recipient_name) {
        return Err(ApiError::Validation(
            "Cannot transfer funds to yourself".into(),
        ));
    }

    let quote = TransferQuote::for_amount(request.amount);

    let repo = TransferRepository::new(state.pool.clone());
    let transfer = repo
        .execute_transfer(
            auth.player_id,
            &auth.name,
            &request.recipient_name,
            request.amount,
            quote.commission,
            request.message.as_deref(),
        )
        .await?;

    let players = PlayerRepository::new(state.pool.clone());
    let new_balance = players
        .find_by_id(auth.player_id)
        .await?
        .map_or(0, |p| p.game_balance);

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transfer: transfer.into_model(),
            new_balance,
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// One of all / sent / received. Defaults to all.
    #[serde(rename = "type")]
    pub direction: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub transfers: Vec<Transfer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// The player's transfer history.
///
/// GET /api/v1/transfers/history
pub async fn transfer_history(
    State(state): State<AppState>,
    auth: PlayerAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let direction = match query.direction.as_deref() {
        None | Some("all") => TransferDirection::All,
        Some("sent") => TransferDirection::Sent,
        Some("received") => TransferDirection::Received,
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Unknown type '{}', expected all/sent/received",
                other
            )))
        }
    };

    let before = match query.cursor.as_deref() {
        Some(cursor) => {
            Some(decode_cursor(cursor).map_err(|e| ApiError::Validation(e.to_string()))?)
        }
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let repo = TransferRepository::new(state.pool.clone());
    let entities = repo
        .history_for_player(auth.player_id, direction, before, limit)
        .await?;

    let next_cursor = if entities.len() as i64 == limit {
        entities.last().map(|t| encode_cursor(t.created_at, t.id))
    } else {
        None
    };

    let transfers = entities.into_iter().map(|e| e.into_model()).collect();

    Ok(Json(HistoryResponse {
        transfers,
        next_cursor,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub sent_count: i64,
    pub sent_amount: i64,
    pub sent_commission: i64,
    pub received_count: i64,
    pub received_amount: i64,
    pub commission_percent: i32,
    pub min_transfer_amount: i64,
}

/// The player's aggregate transfer statistics.
///
/// GET /api/v1/transfers/stats
pub async fn transfer_stats(
    State(state): State<AppState>,
    auth: PlayerAuth,
) -> Result<Json<StatsResponse>, ApiError> {
    let repo = TransferRepository::new(state.pool.clone());
    let stats = repo.stats_for_player(auth.player_id).await?;
    let quote = TransferQuote::for_amount(MIN_TRANSFER_AMOUNT);

    Ok(Json(StatsResponse {
        sent_count: stats.sent_count.unwrap_or(0),
        sent_amount: stats.sent_amount.unwrap_or(0),
        sent_commission: stats.sent_commission.unwrap_or(0),
        received_count: stats.received_count.unwrap_or(0),
        received_amount: stats.received_amount.unwrap_or(0),
        commission_percent: quote.commission_percent,
        min_transfer_amount: quote.min_transfer_amount,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CommissionQuery {
    pub amount: i64,
}

/// Commission breakdown for a prospective transfer.
///
/// GET /api/v1/transfers/commission?amount=N
pub async fn transfer_commission(
    Query(query): Query<CommissionQuery>,
) -> Result<Json<TransferQuote>, ApiError> {
    if query.amount <= 0 {
        return Err(ApiError::Validation("Amount must be positive".into()));
    }

    Ok(Json(TransferQuote::for_amount(query.amount)))
}
