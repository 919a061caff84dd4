//! Coupon domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, round_money, Entity};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` percent off the subtotal
    Percentage,
    /// `value` taka off the subtotal
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: f64,
    #[serde(default)]
    pub min_order_amount: f64,
    /// Cap for percentage discounts
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Coupon {
    /// Check whether the coupon can be redeemed against `subtotal` at `now`
    pub fn check_redeemable(&self, subtotal: f64, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::Validation(format!(
                "Coupon {} is not active",
                self.code
            )));
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(DomainError::Validation(format!(
                "Coupon {} has expired",
                self.code
            )));
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.used_count >= limit)
        {
            return Err(DomainError::Validation(format!(
                "Coupon {} has reached its usage limit",
                self.code
            )));
        }
        if subtotal < self.min_order_amount {
            return Err(DomainError::Validation(format!(
                "Coupon {} requires a minimum order of {:.2}",
                self.code, self.min_order_amount
            )));
        }
        Ok(())
    }

    /// Discount for `subtotal`; never exceeds the subtotal itself
    pub fn discount_for(&self, subtotal: f64) -> f64 {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let amount = subtotal * self.value / 100.0;
                match self.max_discount {
                    Some(cap) => amount.min(cap),
                    None => amount,
                }
            }
            DiscountType::Fixed => self.value,
        };
        round_money(raw.clamp(0.0, subtotal.max(0.0)))
    }
}

impl Entity for Coupon {
    const COLLECTION: &'static str = "coupons";
    const NAME: &'static str = "Coupon";

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        self.code = self.code.trim().to_uppercase();
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.code, "code")?;
        if !self
            .code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::Validation(
                "code may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }
        require_non_negative(self.value, "value")?;
        require_non_negative(self.min_order_amount, "minOrderAmount")?;
        if let Some(cap) = self.max_discount {
            require_non_negative(cap, "maxDiscount")?;
        }
        if self.discount_type == DiscountType::Percentage && self.value > 100.0 {
            return Err(DomainError::Validation(
                "percentage discount cannot exceed 100".to_string(),
            ));
        }
        Ok(())
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("code", self.code.clone())]
    }
}
