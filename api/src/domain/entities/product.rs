//! Product domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, slug_or_id, Entity};
use crate::error::DomainError;

/// Product visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Listed in the storefront and purchasable
    #[default]
    Active,
    /// Being prepared by an admin
    Draft,
    /// Hidden and no longer sold
    Archived,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Draft => write!(f, "draft"),
            ProductStatus::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "archived" => Ok(ProductStatus::Archived),
            _ => Err(format!("Unknown product status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Sale price; only honoured when below `price`
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a customer pays for one unit
    pub fn selling_price(&self) -> f64 {
        match self.discount_price {
            Some(discount) if discount >= 0.0 && discount < self.price => discount,
            _ => self.price,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && self.stock > 0
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const NAME: &'static str = "Product";

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        let source = if self.slug.trim().is_empty() {
            &self.name
        } else {
            &self.slug
        };
        self.slug = slug_or_id(source, &self.id);
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.name, "name")?;
        require_non_negative(self.price, "price")?;
        if let Some(discount) = self.discount_price {
            require_non_negative(discount, "discountPrice")?;
        }
        if self.stock < 0 {
            return Err(DomainError::Validation(
                "stock must not be negative".to_string(),
            ));
        }
        require_non_empty(&self.slug, "slug")?;
        Ok(())
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("slug", self.slug.clone())]
    }
}
