//! Notification handlers

use axum::extract::State;

use crate::app::ListParams;
use crate::auth::AdminAccess;
use crate::domain::entities::Notification;
use crate::error::AppError;
use crate::handlers::extract::{ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};
use crate::AppState;

/// GET /api/users/:id/notifications
pub async fn user_notifications(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<Notification>>, AppError> {
    let page = state.notifications.for_user(&user_id, &params).await?;
    Ok(ApiResponse::ok("Notifications fetched successfully", page))
}

/// PATCH /api/notifications/:id/read
pub async fn mark_notification_read(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Notification>, AppError> {
    let notification = state.notifications.mark_read(&id).await?;
    Ok(ApiResponse::ok("Notification marked as read", notification))
}
