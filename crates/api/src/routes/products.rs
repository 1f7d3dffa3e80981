//! Product catalog endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use domain::models::product::{CreateProductRequest, Product};
use persistence::repositories::product::ProductInput;
use persistence::repositories::ProductRepository;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
}

fn to_input(request: CreateProductRequest) -> Result<ProductInput, ApiError> {
    request.validate()?;
    request
        .check_config()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let items = match &request.items {
        Some(items) => Some(
            serde_json::to_value(items)
                .map_err(|e| ApiError::Internal(format!("Item serialization failed: {}", e)))?,
        ),
        None => None,
    };
    let execution_config = serde_json::to_value(&request.execution_config)
        .map_err(|e| ApiError::Internal(format!("Config serialization failed: {}", e)))?;

    Ok(ProductInput {
        name: request.name,
        description: request.description,
        kind: request.kind.as_str().to_string(),
        game_price: request.game_price,
        donate_price: request.donate_price,
        max_purchases_per_player: request.max_purchases_per_player,
        items,
        subscription_days: request.subscription_days,
        execution_config,
        auto_execute: request.auto_execute,
        requires_manual_approval: request.requires_manual_approval,
    })
}

/// List active products.
///
/// GET /api/v1/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let repo = ProductRepository::new(state.pool.clone());

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let entities = repo.list(query.kind.as_deref(), true, limit, offset).await?;
    // Rows with an unrecognized kind are admin mistakes; hide them from
    // the shop rather than failing the whole listing.
    let products = entities.into_iter().filter_map(|e| e.into_model()).collect();

    Ok(Json(ListProductsResponse { products }))
}

/// Get one active product.
///
/// GET /api/v1/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let repo = ProductRepository::new(state.pool.clone());

    let product = repo
        .find_active_by_id(id)
        .await?
        .and_then(|e| e.into_model())
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Ok(Json(product))
}

/// Create a product (admin).
///
/// POST /api/v1/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let input = to_input(request)?;
    let repo = ProductRepository::new(state.pool.clone());

    let entity = repo.create(input).await?;
    let product = entity
        .into_model()
        .ok_or_else(|| ApiError::Internal("Created product failed to round-trip".into()))?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product definition (admin).
///
/// PUT /api/v1/admin/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let input = to_input(request)?;
    let repo = ProductRepository::new(state.pool.clone());

    let entity = repo
        .update(id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    let product = entity
        .into_model()
        .ok_or_else(|| ApiError::Internal("Updated product failed to round-trip".into()))?;

    Ok(Json(product))
}

/// Soft-delete a product (admin).
///
/// DELETE /api/v1/admin/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = ProductRepository::new(state.pool.clone());

    if repo.deactivate(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Product not found".into()))
    }
}
