//! Shipment handlers
//!
//! Booking and status sync against the Steadfast courier.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::{BulkShipmentResult, SyncResult, SyncSummary, TrackingInfo};
use crate::auth::AdminAccess;
use crate::domain::entities::Order;
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShipmentRequest {
    pub order_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub current_balance: f64,
}

/// POST /api/orders/:id/shipment
pub async fn create_shipment(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
) -> Result<ApiResponse<Order>, AppError> {
    let order = state.shipments.create_shipment(&order_id).await?;
    Ok(ApiResponse::created("Shipment created successfully", order))
}

/// POST /api/shipments/bulk
pub async fn bulk_create_shipments(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkShipmentRequest>,
) -> Result<ApiResponse<Vec<BulkShipmentResult>>, AppError> {
    let results = state.shipments.bulk_create(&request.order_ids).await?;
    let booked = results.iter().filter(|r| r.success).count();
    Ok(ApiResponse::ok(
        format!("{} of {} orders booked", booked, results.len()),
        results,
    ))
}

/// POST /api/orders/:id/shipment/sync
pub async fn sync_shipment(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
) -> Result<ApiResponse<SyncResult>, AppError> {
    let result = state.shipments.sync_order(&order_id).await?;
    let message = if result.changed {
        "Shipment status updated"
    } else {
        "Shipment status unchanged"
    };
    Ok(ApiResponse::ok(message, result))
}

/// POST /api/shipments/sync
pub async fn sync_all_shipments(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<ApiResponse<SyncSummary>, AppError> {
    let summary = state.shipments.sync_all().await?;
    Ok(ApiResponse::ok("Shipments synced", summary))
}

/// GET /api/shipments/balance
pub async fn courier_balance(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<ApiResponse<BalanceResponse>, AppError> {
    let current_balance = state.shipments.balance().await?;
    Ok(ApiResponse::ok(
        "Balance fetched successfully",
        BalanceResponse { current_balance },
    ))
}

/// GET /api/shipments/track/:tracking_code
pub async fn track_shipment(
    State(state): State<AppState>,
    ApiPath(tracking_code): ApiPath<String>,
) -> Result<ApiResponse<TrackingInfo>, AppError> {
    let info = state.shipments.track(&tracking_code).await?;
    Ok(ApiResponse::ok("Tracking status fetched", info))
}
