//! Category domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, slug_or_id, Entity};
use crate::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Parent category for nested menus
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";
    const NAME: &'static str = "Category";

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
        require_non_empty(&self.slug, "slug")?;
        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(DomainError::Validation(
                "a category cannot be its own parent".to_string(),
            ));
        }
        Ok(())
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("slug", self.slug.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            slug: String::new(),
            image: None,
            parent_id: None,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn latin_names_are_slugified() {
        let mut cat = category("c1", "  Men's Panjabi ");
        cat.normalize();
        assert_eq!(cat.name, "Men's Panjabi");
        assert_eq!(cat.slug, "men-s-panjabi");
        assert!(cat.validate().is_ok());
    }

    #[test]
    fn bangla_names_fall_back_to_id_prefix() {
        let mut saree = category("9f8e7d6c-1111-2222-3333-444455556666", "শাড়ি");
        let mut panjabi = category("0a1b2c3d-1111-2222-3333-444455556666", "পাঞ্জাবি");
        saree.normalize();
        panjabi.normalize();
        assert_eq!(saree.slug, "9f8e7d6c");
        assert_eq!(panjabi.slug, "0a1b2c3d");
        assert!(saree.validate().is_ok());
    }

    #[test]
    fn own_parent_is_rejected() {
        let mut cat = category("c1", "Saree");
        cat.parent_id = Some("c1".to_string());
        cat.normalize();
        assert!(matches!(cat.validate(), Err(DomainError::Validation(_))));
    }
}
