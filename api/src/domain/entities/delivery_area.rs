//! Delivery area entity
//!
//! A shipping zone with a flat delivery charge, e.g. "Inside Dhaka".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, Entity};
use crate::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryArea {
    pub id: String,
    pub name: String,
    pub charge: f64,
    #[serde(default)]
    pub estimated_days: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Entity for DeliveryArea {
    const COLLECTION: &'static str = "deliveryAreas";
    const NAME: &'static str = "Delivery area";

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.name, "name")?;
        require_non_negative(self.charge, "charge")
    }
}
