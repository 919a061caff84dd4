//! Cart and wishlist entities
//!
//! Both are keyed by the owning user's id, one document per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Owning user id
    pub id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id.to_string(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Add `quantity` units, merging with an existing line
    pub fn add(&mut self, product_id: &str, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| {
                DomainError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;
        item.quantity = quantity;
        Ok(())
    }

    /// Remove a line; returns whether it was present
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Entity for Cart {
    const COLLECTION: &'static str = "carts";
    const NAME: &'static str = "Cart";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    /// Owning user id
    pub id: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id.to_string(),
            product_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Idempotent; returns whether the product was newly added
    pub fn add(&mut self, product_id: &str) -> bool {
        if self.product_ids.iter().any(|id| id == product_id) {
            return false;
        }
        self.product_ids.push(product_id.to_string());
        true
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|id| id != product_id);
        self.product_ids.len() != before
    }
}

impl Entity for Wishlist {
    const COLLECTION: &'static str = "wishlists";
    const NAME: &'static str = "Wishlist";

    fn id(&self) -> &str {
        &self.id
    }
}
