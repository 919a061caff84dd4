//! Storefront content: hero banners and the scrolling marquee

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, Entity};
use crate::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub title: String,
    /// Public image URL, usually from `POST /api/banners/upload`
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Display order, ascending
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Banner {
    const COLLECTION: &'static str = "banners";
    const NAME: &'static str = "Banner";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.title, "title")?;
        require_non_empty(&self.image, "image")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marquee {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Marquee {
    const COLLECTION: &'static str = "marquees";
    const NAME: &'static str = "Marquee";

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        self.text = self.text.trim().to_string();
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty(&self.text, "text")
    }
}

fn default_true() -> bool {
    true
}
