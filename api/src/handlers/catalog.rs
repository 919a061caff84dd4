//! Catalog handlers
//!
//! Storefront product lookups and review submission. Product reads show
//! draft and archived products only to admins.

use axum::extract::State;
use serde_json::Value;

use crate::app::ListParams;
use crate::auth::AdminView;
use crate::domain::entities::{Product, Review};
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};
use crate::AppState;

/// GET /api/products
pub async fn list_products(
    AdminView(admin): AdminView,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Product>>, AppError> {
    let page = state.catalog.list_products(&params, admin).await?;
    Ok(ApiResponse::ok("Product list fetched successfully", page))
}

/// GET /api/products/:id
pub async fn get_product(
    AdminView(admin): AdminView,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Product>, AppError> {
    let product = state.catalog.product(&id, admin).await?;
    Ok(ApiResponse::ok("Product fetched successfully", product))
}

/// GET /api/products/slug/:slug
pub async fn product_by_slug(
    AdminView(admin): AdminView,
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<Product>, AppError> {
    let product = state.catalog.product_by_slug(&slug, admin).await?;
    Ok(ApiResponse::ok("Product fetched successfully", product))
}

/// GET /api/categories/:id/products
pub async fn products_in_category(
    AdminView(admin): AdminView,
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Product>>, AppError> {
    let page = state
        .catalog
        .products_in_category(&category_id, &params, admin)
        .await?;
    Ok(ApiResponse::ok("Products fetched successfully", page))
}

/// GET /api/products/:id/reviews
///
/// Approved reviews only.
pub async fn product_reviews(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Review>>, AppError> {
    let page = state.catalog.product_reviews(&product_id, &params).await?;
    Ok(ApiResponse::ok("Reviews fetched successfully", page))
}

/// POST /api/reviews
pub async fn submit_review(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse<Review>, AppError> {
    let review = state.catalog.submit_review(body).await?;
    Ok(ApiResponse::created(
        "Review submitted and awaiting approval",
        review,
    ))
}
