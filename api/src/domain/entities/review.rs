//! Product review entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, Entity};
use crate::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    /// Only approved reviews are shown in the storefront
    #[serde(default)]
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Review {
    const COLLECTION: &'static str = "reviews";
    const NAME: &'static str = "Review";

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        self.user_name = self.user_name.trim().to_string();
        self.comment = self.comment.trim().to_string();
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.product_id, "productId")?;
        require_non_empty(&self.user_name, "userName")?;
        if !(1..=5).contains(&self.rating) {
            return Err(DomainError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_review;

    #[test]
    fn rating_bounds() {
        let mut review = test_review("p1");
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 6;
        assert!(review.validate().is_err());
        review.rating = 5;
        assert!(review.validate().is_ok());
    }
}
