//! Courier client port trait
//!
//! Defines the interface for booking parcels and tracking them with the
//! Steadfast courier API.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CourierError;

/// Accept ids the courier sends either as JSON numbers or strings
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A parcel booking request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelRequest {
    pub invoice: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub cod_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A booked consignment as returned by the courier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consignment {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub consignment_id: Option<String>,
    pub invoice: String,
    pub tracking_code: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub cod_amount: Option<f64>,
    /// Initial delivery status, usually `in_review`
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Outcome for one parcel of a bulk booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkParcelResult {
    pub invoice: String,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub consignment_id: Option<String>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    /// `success` or `error`
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl BulkParcelResult {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success") && self.consignment_id.is_some()
    }
}

#[async_trait]
pub trait CourierClient: Send + Sync {
    /// Book a single parcel
    async fn create_order(&self, parcel: &ParcelRequest) -> Result<Consignment, CourierError>;

    /// Book several parcels in one call; per-parcel failures are reported, not raised
    async fn bulk_create_orders(
        &self,
        parcels: &[ParcelRequest],
    ) -> Result<Vec<BulkParcelResult>, CourierError>;

    /// Raw delivery status string for a consignment id
    async fn status_by_consignment_id(&self, consignment_id: &str)
        -> Result<String, CourierError>;

    /// Raw delivery status string for an invoice
    async fn status_by_invoice(&self, invoice: &str) -> Result<String, CourierError>;

    /// Raw delivery status string for a tracking code
    async fn status_by_tracking_code(&self, tracking_code: &str) -> Result<String, CourierError>;

    /// Current merchant account balance
    async fn current_balance(&self) -> Result<f64, CourierError>;
}
