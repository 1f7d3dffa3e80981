//! Promo code endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::promo_code::{CreatePromoCodeRequest, PromoCode};
use domain::services::pricing::validate_promo;
use persistence::repositories::promo_code::PromoCodeInput;
use persistence::repositories::PromoCodeRepository;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQuery {
    pub code: String,
    pub product_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub promocode: PromoCode,
}

/// Check a promo code before purchase. Does NOT consume a use.
///
/// GET /api/v1/shop/promocode/validate?code=X&productId=Y
pub async fn validate_promocode(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let repo = PromoCodeRepository::new(state.pool.clone());

    let promo = repo
        .find_by_code(&query.code)
        .await?
        .ok_or_else(|| ApiError::BusinessRule {
            code: "promo_invalid",
            message: "Promo code is invalid, expired, or exhausted".into(),
        })?
        .into_model();

    // Validate against a concrete product when one is given; otherwise
    // only usability (active, window, uses) is checked.
    let product_id = query.product_id.unwrap_or(0);
    match query.product_id {
        Some(_) => validate_promo(&promo, product_id, Utc::now())?,
        None => {
            if !promo.is_usable(Utc::now()) {
                return Err(domain::services::pricing::PricingError::PromoInvalid.into());
            }
        }
    }

    Ok(Json(ValidateResponse {
        valid: true,
        promocode: promo,
    }))
}

/// Create a promo code (admin).
///
/// POST /api/v1/admin/promocodes
pub async fn create_promocode(
    State(state): State<AppState>,
    Json(request): Json<CreatePromoCodeRequest>,
) -> Result<(StatusCode, Json<PromoCode>), ApiError> {
    request.validate()?;

    let applicable_products = match &request.applicable_products {
        Some(ids) => Some(
            serde_json::to_value(ids)
                .map_err(|e| ApiError::Internal(format!("Serialization failed: {}", e)))?,
        ),
        None => None,
    };

    let repo = PromoCodeRepository::new(state.pool.clone());
    let entity = repo
        .create(PromoCodeInput {
            code: request.code,
            discount_percent: request.discount_percent,
            uses_left: request.uses_left,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            applicable_products,
        })
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                ApiError::Conflict("A promo code with this code already exists".into())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(entity.into_model())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub promocodes: Vec<PromoCode>,
}

/// List promo codes (admin).
///
/// GET /api/v1/admin/promocodes
pub async fn list_promocodes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let repo = PromoCodeRepository::new(state.pool.clone());

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let promocodes = repo
        .list(query.active_only, limit, offset)
        .await?
        .into_iter()
        .map(|e| e.into_model())
        .collect();

    Ok(Json(ListResponse { promocodes }))
}

/// Deactivate a promo code (admin).
///
/// POST /api/v1/admin/promocodes/:id/deactivate
pub async fn deactivate_promocode(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = PromoCodeRepository::new(state.pool.clone());

    if repo.deactivate(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Promo code not found".into()))
    }
}
