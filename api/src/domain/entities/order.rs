//! Order domain entity
//!
//! Orders snapshot product name and price at checkout, so later catalog edits
//! never change what a customer was charged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_valid_email, is_valid_phone, require_non_empty, round_money, Entity};
use crate::error::DomainError;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Admin-driven transitions: forward along the fulfilment path, or cancel
    /// from any non-terminal status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery, collected by the courier
    #[default]
    Cod,
    Online,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
}

impl Customer {
    pub fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.name, "customer.name")?;
        require_non_empty(&self.address, "customer.address")?;
        if !is_valid_phone(&self.phone) {
            return Err(DomainError::Validation(format!(
                "invalid phone number: {}",
                self.phone
            )));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !is_valid_email(email) {
                return Err(DomainError::Validation(format!(
                    "invalid email address: {}",
                    email
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        round_money(self.price * f64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub invoice: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub delivery_area_id: Option<String>,
    #[serde(default)]
    pub delivery_charge: f64,
    pub subtotal: f64,
    #[serde(default)]
    pub discount: f64,
    pub total: f64,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    /// Steadfast consignment id once the parcel is booked
    #[serde(default)]
    pub consignment_id: Option<String>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    /// Last delivery status reported by Steadfast
    #[serde(default)]
    pub steadfast_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Amount the courier should collect on delivery
    pub fn cod_amount(&self) -> f64 {
        match self.payment_method {
            PaymentMethod::Cod => self.total,
            PaymentMethod::Online => 0.0,
        }
    }

    pub fn is_booked(&self) -> bool {
        self.consignment_id.is_some()
    }
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    const NAME: &'static str = "Order";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), DomainError> {
        self.customer.validate()?;
        if self.items.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }
        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(DomainError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
