//! Shipment service
//!
//! Books orders with the courier and keeps local order status in step with
//! the courier's delivery status, either by polling or from webhook pushes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::order_service::OrderService;
use crate::domain::entities::{
    order_status_for, reconcile, shipment::normalize, Order, OrderStatus,
};
use crate::domain::filter::Filter;
use crate::domain::ports::courier::deserialize_string_or_number;
use crate::domain::ports::{CourierClient, ParcelRequest};
use crate::error::{AppError, CourierError, DomainError};

/// Upper bound the courier accepts in one bulk booking
pub const MAX_BULK_ORDERS: usize = 500;

/// Courier push notification.
///
/// Steadfast sends `status` on delivery updates; older integrations send
/// `delivery_status`. Tracking-message pushes carry neither and are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub consignment_id: Option<String>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub invoice: Option<String>,
    #[serde(default)]
    pub delivery_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl WebhookPayload {
    fn raw_status(&self) -> Option<&str> {
        self.delivery_status
            .as_deref()
            .or(self.status.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Updated,
    Unchanged,
    UnknownOrder,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShipmentResult {
    pub order_id: String,
    pub invoice: Option<String>,
    pub success: bool,
    pub consignment_id: Option<String>,
    pub tracking_code: Option<String>,
    pub error: Option<String>,
}

impl BulkShipmentResult {
    fn failed(order_id: &str, invoice: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            order_id: order_id.to_string(),
            invoice: invoice.map(str::to_string),
            success: false,
            consignment_id: None,
            tracking_code: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub order: Order,
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_code: String,
    pub delivery_status: String,
    /// Local status the courier status settles to, if final
    pub order_status: Option<OrderStatus>,
    pub invoice: Option<String>,
}

pub struct ShipmentService {
    orders: Arc<OrderService>,
    courier: Arc<dyn CourierClient>,
}

fn parcel_for(order: &Order) -> ParcelRequest {
    ParcelRequest {
        invoice: order.invoice.clone(),
        recipient_name: order.customer.name.clone(),
        recipient_phone: order.customer.phone.clone(),
        recipient_address: order.customer.address.clone(),
        cod_amount: order.cod_amount(),
        note: order.note.clone(),
    }
}

/// Why an order cannot be booked, if it cannot
fn booking_blocker(order: &Order) -> Option<String> {
    if order.status.is_terminal() {
        Some(format!("Order {} is already {}", order.invoice, order.status))
    } else if order.is_booked() {
        Some(format!(
            "Order {} is already booked with the courier",
            order.invoice
        ))
    } else {
        None
    }
}

impl ShipmentService {
    pub fn new(orders: Arc<OrderService>, courier: Arc<dyn CourierClient>) -> Self {
        Self { orders, courier }
    }

    pub async fn create_shipment(&self, order_id: &str) -> Result<Order, AppError> {
        let order = self.orders.get(order_id).await?;
        if let Some(reason) = booking_blocker(&order) {
            return Err(DomainError::Conflict(reason).into());
        }

        let consignment = self.courier.create_order(&parcel_for(&order)).await?;
        let consignment_id = consignment.consignment_id.ok_or_else(|| {
            CourierError::Rejected("courier returned no consignment id".to_string())
        })?;
        tracing::info!(
            order_id = %order.id,
            consignment_id = %consignment_id,
            tracking_code = %consignment.tracking_code,
            "Shipment booked"
        );

        self.orders
            .mark_booked(
                order,
                consignment_id,
                Some(consignment.tracking_code),
                normalize(&consignment.status),
            )
            .await
    }

    /// Book several orders in one courier call; each order reports its own outcome
    pub async fn bulk_create(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<BulkShipmentResult>, AppError> {
        if order_ids.is_empty() {
            return Err(AppError::BadRequest("orderIds must not be empty".to_string()));
        }
        if order_ids.len() > MAX_BULK_ORDERS {
            return Err(AppError::BadRequest(format!(
                "at most {} orders can be booked at once",
                MAX_BULK_ORDERS
            )));
        }

        let mut results = Vec::with_capacity(order_ids.len());
        let mut eligible: Vec<Order> = Vec::new();
        for order_id in order_ids {
            match self.orders.get(order_id).await {
                Ok(order) => match booking_blocker(&order) {
                    Some(reason) => results.push(BulkShipmentResult::failed(
                        order_id,
                        Some(&order.invoice),
                        reason,
                    )),
                    None => eligible.push(order),
                },
                Err(AppError::NotFound(msg)) => {
                    results.push(BulkShipmentResult::failed(order_id, None, msg))
                }
                Err(e) => return Err(e),
            }
        }
        if eligible.is_empty() {
            return Ok(results);
        }

        let parcels: Vec<ParcelRequest> = eligible.iter().map(parcel_for).collect();
        let booked = self.courier.bulk_create_orders(&parcels).await?;

        for order in eligible {
            let outcome = booked.iter().find(|r| r.invoice == order.invoice);
            match outcome {
                Some(r) if r.is_success() => {
                    let consignment_id = r.consignment_id.clone().unwrap_or_default();
                    let order_id = order.id.clone();
                    let invoice = order.invoice.clone();
                    let order = self
                        .orders
                        .mark_booked(
                            order,
                            consignment_id.clone(),
                            r.tracking_code.clone(),
                            "in_review".to_string(),
                        )
                        .await?;
                    tracing::info!(order_id = %order_id, consignment_id = %consignment_id, "Shipment booked in bulk");
                    results.push(BulkShipmentResult {
                        order_id,
                        invoice: Some(invoice),
                        success: true,
                        consignment_id: Some(consignment_id),
                        tracking_code: order.tracking_code,
                        error: None,
                    });
                }
                Some(r) => results.push(BulkShipmentResult::failed(
                    &order.id,
                    Some(&order.invoice),
                    r.error
                        .clone()
                        .unwrap_or_else(|| "courier rejected the parcel".to_string()),
                )),
                None => results.push(BulkShipmentResult::failed(
                    &order.id,
                    Some(&order.invoice),
                    "courier did not report this parcel",
                )),
            }
        }
        Ok(results)
    }

    async fn reconcile_order(&self, order: Order, raw_status: &str) -> Result<SyncResult, AppError> {
        match reconcile(&order, raw_status) {
            Some(update) => {
                let order = self.orders.apply_shipment_update(order, update).await?;
                Ok(SyncResult {
                    order,
                    changed: true,
                })
            }
            None => Ok(SyncResult {
                order,
                changed: false,
            }),
        }
    }

    /// Poll the courier for one order and reconcile
    pub async fn sync_order(&self, order_id: &str) -> Result<SyncResult, AppError> {
        let order = self.orders.get(order_id).await?;
        let Some(consignment_id) = order.consignment_id.clone() else {
            return Err(DomainError::Conflict(format!(
                "Order {} has not been booked with the courier",
                order.invoice
            ))
            .into());
        };

        let raw = match self.courier.status_by_consignment_id(&consignment_id).await {
            Ok(raw) => raw,
            Err(e @ (CourierError::Api { status: 404, .. } | CourierError::Deserialization(_))) => {
                tracing::warn!(
                    order_id = %order.id,
                    consignment_id = %consignment_id,
                    "Consignment lookup failed ({}); retrying by invoice",
                    e
                );
                self.courier.status_by_invoice(&order.invoice).await?
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(order_id = %order.id, consignment_id = %consignment_id, status = %raw, "Polled courier status");
        self.reconcile_order(order, &raw).await
    }

    /// Poll every booked, non-terminal order
    pub async fn sync_all(&self) -> Result<SyncSummary, AppError> {
        let open = Filter::Or(vec![
            Filter::eq("status", OrderStatus::Pending.to_string()),
            Filter::eq("status", OrderStatus::Processing.to_string()),
            Filter::eq("status", OrderStatus::Shipped.to_string()),
        ]);
        let orders = self.orders.find_all(Some(open)).await?;

        let mut summary = SyncSummary::default();
        for order in orders.into_iter().filter(Order::is_booked) {
            summary.checked += 1;
            let order_id = order.id.clone();
            match self.sync_order(&order_id).await {
                Ok(result) if result.changed => summary.updated += 1,
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(order_id = %order_id, "Courier sync failed: {}", e);
                }
            }
        }

        tracing::info!(
            checked = summary.checked,
            updated = summary.updated,
            failed = summary.failed,
            "Courier sync finished"
        );
        Ok(summary)
    }

    pub async fn balance(&self) -> Result<f64, AppError> {
        Ok(self.courier.current_balance().await?)
    }

    /// Storefront tracking lookup by tracking code
    pub async fn track(&self, tracking_code: &str) -> Result<TrackingInfo, AppError> {
        let raw = self.courier.status_by_tracking_code(tracking_code).await?;
        let order = self
            .orders
            .find_by_field("trackingCode", tracking_code)
            .await?;
        Ok(TrackingInfo {
            tracking_code: tracking_code.to_string(),
            delivery_status: normalize(&raw),
            order_status: order_status_for(&raw),
            invoice: order.map(|o| o.invoice),
        })
    }

    /// Find the order a webhook refers to: consignment id, then tracking code, then invoice
    async fn order_for_webhook(&self, payload: &WebhookPayload) -> Result<Option<Order>, AppError> {
        let keys = [
            ("consignmentId", payload.consignment_id.as_deref()),
            ("trackingCode", payload.tracking_code.as_deref()),
            ("invoice", payload.invoice.as_deref()),
        ];
        for (field, value) in keys {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            if let Some(order) = self.orders.find_by_field(field, value).await? {
                return Ok(Some(order));
            }
        }
        Ok(None)
    }

    pub async fn handle_webhook(&self, payload: &WebhookPayload) -> Result<WebhookOutcome, AppError> {
        let Some(raw) = payload.raw_status() else {
            tracing::debug!(notification_type = ?payload.notification_type, "Webhook without delivery status ignored");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(order) = self.order_for_webhook(payload).await? else {
            tracing::warn!(
                consignment_id = ?payload.consignment_id,
                tracking_code = ?payload.tracking_code,
                invoice = ?payload.invoice,
                "Webhook for unknown order"
            );
            return Ok(WebhookOutcome::UnknownOrder);
        };

        let order_id = order.id.clone();
        let result = self.reconcile_order(order, raw).await?;
        tracing::info!(order_id = %order_id, status = %raw, changed = result.changed, "Courier webhook processed");
        Ok(if result.changed {
            WebhookOutcome::Updated
        } else {
            WebhookOutcome::Unchanged
        })
    }
}
