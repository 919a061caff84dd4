//! Courier delivery status and its reconciliation into order status
//!
//! Steadfast reports delivery progress as snake_case strings. Only final
//! outcomes move the local order: delivered (including awaiting approval)
//! becomes `DELIVERED`, cancelled (including awaiting approval) becomes
//! `CANCELLED`. Every other status is mirrored into `steadfastStatus` only.

use serde::{Deserialize, Serialize};

use super::{Order, OrderStatus};

/// Delivery statuses the Steadfast API reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InReview,
    Hold,
    DeliveredApprovalPending,
    PartialDeliveredApprovalPending,
    CancelledApprovalPending,
    UnknownApprovalPending,
    Delivered,
    PartialDelivered,
    Cancelled,
    Unknown,
}

impl DeliveryStatus {
    /// Local order status this courier status settles to, if any
    pub fn order_status(self) -> Option<OrderStatus> {
        match self {
            DeliveryStatus::Delivered | DeliveryStatus::DeliveredApprovalPending => {
                Some(OrderStatus::Delivered)
            }
            DeliveryStatus::Cancelled | DeliveryStatus::CancelledApprovalPending => {
                Some(OrderStatus::Cancelled)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InReview => "in_review",
            DeliveryStatus::Hold => "hold",
            DeliveryStatus::DeliveredApprovalPending => "delivered_approval_pending",
            DeliveryStatus::PartialDeliveredApprovalPending => {
                "partial_delivered_approval_pending"
            }
            DeliveryStatus::CancelledApprovalPending => "cancelled_approval_pending",
            DeliveryStatus::UnknownApprovalPending => "unknown_approval_pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::PartialDelivered => "partial_delivered",
            DeliveryStatus::Cancelled => "cancelled",
            DeliveryStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(DeliveryStatus::Pending),
            "in_review" => Ok(DeliveryStatus::InReview),
            "hold" => Ok(DeliveryStatus::Hold),
            "delivered_approval_pending" => Ok(DeliveryStatus::DeliveredApprovalPending),
            "partial_delivered_approval_pending" => {
                Ok(DeliveryStatus::PartialDeliveredApprovalPending)
            }
            "cancelled_approval_pending" => Ok(DeliveryStatus::CancelledApprovalPending),
            "unknown_approval_pending" => Ok(DeliveryStatus::UnknownApprovalPending),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "partial_delivered" => Ok(DeliveryStatus::PartialDelivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            "unknown" => Ok(DeliveryStatus::Unknown),
            _ => Err(format!("Unknown delivery status: {}", s)),
        }
    }
}

/// Canonical form of a courier status string: trimmed, lower-case, `_` for spaces and dashes
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Map a raw courier status string to the local order status it implies
pub fn order_status_for(raw: &str) -> Option<OrderStatus> {
    raw.parse::<DeliveryStatus>()
        .ok()
        .and_then(DeliveryStatus::order_status)
}

/// Fields to write back to an order after a courier status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentUpdate {
    pub steadfast_status: String,
    /// Present only when the order status actually changes
    pub status: Option<OrderStatus>,
}

/// Compare a courier report with the stored order; `None` means nothing changed
pub fn reconcile(order: &Order, raw_status: &str) -> Option<ShipmentUpdate> {
    let steadfast_status = normalize(raw_status);
    if steadfast_status.is_empty() {
        return None;
    }

    let status = order_status_for(&steadfast_status).filter(|next| *next != order.status);
    let courier_changed = order.steadfast_status.as_deref() != Some(steadfast_status.as_str());

    if !courier_changed && status.is_none() {
        return None;
    }

    Some(ShipmentUpdate {
        steadfast_status,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_order;

    #[test]
    fn status_table() {
        assert_eq!(order_status_for("delivered"), Some(OrderStatus::Delivered));
        assert_eq!(
            order_status_for("delivered_approval_pending"),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(order_status_for("cancelled"), Some(OrderStatus::Cancelled));
        assert_eq!(
            order_status_for("cancelled_approval_pending"),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn non_final_statuses_leave_order_alone() {
        for raw in [
            "pending",
            "in_review",
            "hold",
            "partial_delivered",
            "partial_delivered_approval_pending",
            "unknown_approval_pending",
            "unknown",
            "lost_in_space",
            "",
        ] {
            assert_eq!(order_status_for(raw), None, "{raw}");
        }
    }

    #[test]
    fn courier_strings_are_normalized() {
        assert_eq!(order_status_for("Delivered"), Some(OrderStatus::Delivered));
        assert_eq!(
            order_status_for(" Cancelled Approval Pending "),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(
            "In-Review".parse::<DeliveryStatus>(),
            Ok(DeliveryStatus::InReview)
        );
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(
            DeliveryStatus::DeliveredApprovalPending.to_string(),
            "delivered_approval_pending"
        );
        assert_eq!(
            serde_json::to_value(DeliveryStatus::InReview).unwrap(),
            serde_json::json!("in_review")
        );
    }

    #[test]
    fn reconcile_applies_final_status() {
        let mut order = test_order();
        order.status = OrderStatus::Shipped;
        order.steadfast_status = Some("in_review".to_string());

        let update = reconcile(&order, "delivered").unwrap();
        assert_eq!(update.steadfast_status, "delivered");
        assert_eq!(update.status, Some(OrderStatus::Delivered));
    }

    #[test]
    fn reconcile_mirrors_intermediate_status_only() {
        let mut order = test_order();
        order.status = OrderStatus::Shipped;
        order.steadfast_status = Some("in_review".to_string());

        let update = reconcile(&order, "hold").unwrap();
        assert_eq!(update.steadfast_status, "hold");
        assert_eq!(update.status, None);
    }

    #[test]
    fn reconcile_is_noop_when_nothing_changed() {
        let mut order = test_order();
        order.status = OrderStatus::Delivered;
        order.steadfast_status = Some("delivered".to_string());

        assert_eq!(reconcile(&order, "Delivered"), None);
        assert_eq!(reconcile(&order, "   "), None);
    }

    #[test]
    fn reconcile_fixes_status_even_when_courier_status_is_unchanged() {
        let mut order = test_order();
        order.status = OrderStatus::Shipped;
        order.steadfast_status = Some("cancelled".to_string());

        let update = reconcile(&order, "cancelled").unwrap();
        assert_eq!(update.status, Some(OrderStatus::Cancelled));
    }
}
