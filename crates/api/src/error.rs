use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::services::pricing::PricingError;
use persistence::repositories::{LedgerError, TransferError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Business-rule rejection with a stable error code for clients.
    #[error("{message}")]
    BusinessRule {
        code: &'static str,
        message: String,
    },

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::BusinessRule { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let detail = e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "invalid value".to_string());
                    format!("{}: {}", field, detail)
                })
            })
            .collect();

        ApiError::Validation(messages.join("; "))
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        let code = match err {
            PricingError::NoPriceForCurrency => "no_price_for_currency",
            PricingError::PromoInvalid => "promo_invalid",
            PricingError::PromoNotApplicable => "promo_not_applicable",
        };
        ApiError::BusinessRule {
            code,
            message: err.to_string(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProductNotFound => {
                ApiError::NotFound("Product not found or inactive".into())
            }
            LedgerError::PurchaseLimitReached { .. } => ApiError::BusinessRule {
                code: "purchase_limit_reached",
                message: err.to_string(),
            },
            LedgerError::InsufficientFunds { .. } => ApiError::BusinessRule {
                code: "insufficient_funds",
                message: err.to_string(),
            },
            LedgerError::Pricing(e) => e.into(),
            LedgerError::Database(e) => e.into(),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::RecipientNotFound { ref suggestion } => {
                let message = match suggestion {
                    Some(name) => format!("Recipient not found. Did you mean \"{}\"?", name),
                    None => "Recipient not found".to_string(),
                };
                ApiError::NotFound(message)
            }
            TransferError::InsufficientFunds { .. } => ApiError::BusinessRule {
                code: "insufficient_funds",
                message: err.to_string(),
            },
            TransferError::Database(e) => e.into(),
        }
    }
}

impl From<shared::jwt::JwtError> for ApiError {
    fn from(err: shared::jwt::JwtError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<shared::password::PasswordError> for ApiError {
    fn from(err: shared::password::PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(
            ApiError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_business_rule_maps_to_bad_request() {
        let err = ApiError::BusinessRule {
            code: "insufficient_funds",
            message: "insufficient funds: need 90, have 10".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_ledger_product_not_found_is_404() {
        let err: ApiError = LedgerError::ProductNotFound.into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ledger_insufficient_funds_is_400() {
        let err: ApiError = LedgerError::InsufficientFunds {
            required: 90,
            available: 10,
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pricing_errors_have_stable_codes() {
        let err: ApiError = PricingError::PromoInvalid.into();
        match err {
            ApiError::BusinessRule { code, .. } => assert_eq!(code, "promo_invalid"),
            _ => panic!("Expected BusinessRule"),
        }

        let err: ApiError = PricingError::PromoNotApplicable.into();
        match err {
            ApiError::BusinessRule { code, .. } => assert_eq!(code, "promo_not_applicable"),
            _ => panic!("Expected BusinessRule"),
        }
    }

    #[test]
    fn test_transfer_suggestion_in_message() {
        let err: ApiError = TransferError::RecipientNotFound {
            suggestion: Some("Steve".into()),
        }
        .into();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("Steve")),
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }
}
