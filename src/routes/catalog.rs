use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::AccountIdentity,
    models::{
        catalog::{CreateProductRequest, ProductView, UpdateProductRequest},
        common::SuccessResponse,
    },
};

/// GET /api/v1/products
#[instrument(skip(state, _identity))]
pub async fn list_products(
    State(state): State<AppState>,
    _identity: AccountIdentity,
) -> Result<Json<SuccessResponse<Vec<ProductView>>>> {
    let products = state.catalog_service.list_active().await?;

    Ok(Json(SuccessResponse::new(
        products.into_iter().map(ProductView::from).collect(),
    )))
}

/// POST /internal/v1/products
#[instrument(skip(state, request))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<ProductView>>)> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let product = state.catalog_service.create_product(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(ProductView::from(product))),
    ))
}

/// PATCH /internal/v1/products/{code}
#[instrument(skip(state, request))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<SuccessResponse<ProductView>>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let product = state.catalog_service.update_product(&code, request).await?;

    Ok(Json(SuccessResponse::new(ProductView::from(product))))
}
