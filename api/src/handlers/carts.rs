//! Cart and wishlist handlers
//!
//! Keyed by user id in the path; documents are created on first write.

use axum::extract::State;
use serde::Deserialize;

use crate::app::{CartView, WishlistView};
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::AppState;

/// Request body for adding a cart line
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemRequest {
    pub product_id: String,
}

/// GET /api/carts/:user_id
pub async fn get_cart(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<ApiResponse<CartView>, AppError> {
    let cart = state.carts.get_cart(&user_id).await?;
    Ok(ApiResponse::ok("Cart fetched successfully", cart))
}

/// POST /api/carts/:user_id/items
pub async fn add_cart_item(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(request): ApiJson<AddCartItemRequest>,
) -> Result<ApiResponse<CartView>, AppError> {
    let cart = state
        .carts
        .add_item(&user_id, &request.product_id, request.quantity)
        .await?;
    Ok(ApiResponse::ok("Item added to cart", cart))
}

/// PATCH /api/carts/:user_id/items/:product_id
pub async fn update_cart_item(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(String, String)>,
    ApiJson(request): ApiJson<UpdateCartItemRequest>,
) -> Result<ApiResponse<CartView>, AppError> {
    let cart = state
        .carts
        .update_item(&user_id, &product_id, request.quantity)
        .await?;
    Ok(ApiResponse::ok("Cart updated", cart))
}

/// DELETE /api/carts/:user_id/items/:product_id
pub async fn remove_cart_item(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<CartView>, AppError> {
    let cart = state.carts.remove_item(&user_id, &product_id).await?;
    Ok(ApiResponse::ok("Item removed from cart", cart))
}

/// DELETE /api/carts/:user_id
pub async fn clear_cart(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.carts.clear(&user_id).await?;
    Ok(ApiResponse::message("Cart cleared"))
}

/// GET /api/wishlists/:user_id
pub async fn get_wishlist(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<ApiResponse<WishlistView>, AppError> {
    let wishlist = state.carts.get_wishlist(&user_id).await?;
    Ok(ApiResponse::ok("Wishlist fetched successfully", wishlist))
}

/// POST /api/wishlists/:user_id/items
pub async fn add_wishlist_item(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(request): ApiJson<WishlistItemRequest>,
) -> Result<ApiResponse<WishlistView>, AppError> {
    let wishlist = state
        .carts
        .add_to_wishlist(&user_id, &request.product_id)
        .await?;
    Ok(ApiResponse::ok("Added to wishlist", wishlist))
}

/// DELETE /api/wishlists/:user_id/items/:product_id
pub async fn remove_wishlist_item(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<WishlistView>, AppError> {
    let wishlist = state
        .carts
        .remove_from_wishlist(&user_id, &product_id)
        .await?;
    Ok(ApiResponse::ok("Removed from wishlist", wishlist))
}
