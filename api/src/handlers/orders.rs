//! Order handlers
//!
//! Checkout and order lookup are public; listing, status changes and
//! deletion need the admin key.

use axum::extract::State;
use serde::Deserialize;

use crate::app::{CouponQuote, ListParams, PlaceOrderRequest};
use crate::auth::AdminAccess;
use crate::domain::entities::{Order, OrderStatus};
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub subtotal: f64,
}

/// POST /api/orders
pub async fn place_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PlaceOrderRequest>,
) -> Result<ApiResponse<Order>, AppError> {
    let order = state.orders.place_order(request).await?;
    Ok(ApiResponse::created("Order placed successfully", order))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Order>, AppError> {
    let order = state.orders.get(&id).await?;
    Ok(ApiResponse::ok("Order fetched successfully", order))
}

/// GET /api/orders/invoice/:invoice
pub async fn order_by_invoice(
    State(state): State<AppState>,
    ApiPath(invoice): ApiPath<String>,
) -> Result<ApiResponse<Order>, AppError> {
    let order = state.orders.by_invoice(&invoice).await?;
    Ok(ApiResponse::ok("Order fetched successfully", order))
}

/// GET /api/orders
pub async fn list_orders(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Order>>, AppError> {
    let page = state.orders.list(&params).await?;
    Ok(ApiResponse::ok("Orders fetched successfully", page))
}

/// GET /api/users/:id/orders
pub async fn user_orders(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Order>>, AppError> {
    let page = state.orders.list_for_user(&user_id, &params).await?;
    Ok(ApiResponse::ok("Orders fetched successfully", page))
}

/// PATCH /api/orders/:id/status
pub async fn update_order_status(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<ApiResponse<Order>, AppError> {
    let status: OrderStatus = request.status.parse().map_err(AppError::BadRequest)?;
    let order = state.orders.update_status(&id, status).await?;
    Ok(ApiResponse::ok(
        format!("Order status updated to {}", order.status),
        order,
    ))
}

/// DELETE /api/orders/:id
pub async fn delete_order(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.orders.delete(&id).await?;
    tracing::info!(order_id = %id, "Order deleted");
    Ok(ApiResponse::message("Order deleted successfully"))
}

/// POST /api/coupons/validate
pub async fn validate_coupon(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ValidateCouponRequest>,
) -> Result<ApiResponse<CouponQuote>, AppError> {
    let quote = state
        .orders
        .validate_coupon(&request.code, request.subtotal)
        .await?;
    Ok(ApiResponse::ok("Coupon applied", quote))
}
