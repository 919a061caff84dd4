//! Domain entities
//!
//! Typed documents stored in the document store. Every entity serializes with
//! camelCase keys and carries `id`, `createdAt` and `updatedAt`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::DomainError;

pub mod cart;
pub mod category;
pub mod content;
pub mod coupon;
pub mod delivery_area;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;
pub mod shipment;
pub mod user;

pub use cart::{Cart, CartItem, Wishlist};
pub use category::Category;
pub use content::{Banner, Marquee};
pub use coupon::{Coupon, DiscountType};
pub use delivery_area::DeliveryArea;
pub use notification::{Notification, NotificationKind};
pub use order::{Customer, Order, OrderItem, OrderStatus, PaymentMethod};
pub use product::{Product, ProductStatus};
pub use review::Review;
pub use shipment::{order_status_for, reconcile, DeliveryStatus, ShipmentUpdate};
pub use user::{User, UserRole};

/// A document type persisted in its own collection
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the documents live in
    const COLLECTION: &'static str;
    /// Singular display name used in response messages
    const NAME: &'static str;

    fn id(&self) -> &str;

    /// Fill in derived fields (slugs, canonical casing) before validation
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Fields whose values must be unique across the collection
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?88)?01[3-9]\d{8}$").unwrap());

/// Bangladeshi mobile number, optionally prefixed with `88` / `+88`
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)+$").unwrap()
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// URL-safe slug: lowercase ASCII alphanumerics joined by single dashes
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slug for `source`, or the first eight characters of the id when the
/// source has no ASCII letters or digits (Bangla names, for instance)
pub fn slug_or_id(source: &str, id: &str) -> String {
    let slug = slugify(source);
    if slug.is_empty() {
        slugify(id).chars().take(8).collect()
    } else {
        slug
    }
}

/// Round a money amount to two decimals
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_non_negative(value: f64, field: &str) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Men's Panjabi -- Eid 2024!"), "men-s-panjabi-eid-2024");
        assert_eq!(slugify("  Leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("শাড়ি"), "");
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("01711223344"));
        assert!(is_valid_phone("+8801911223344"));
        assert!(is_valid_phone("8801511223344"));
        assert!(!is_valid_phone("01211223344"));
        assert!(!is_valid_phone("0171122334"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("rahim@example.com"));
        assert!(!is_valid_email("rahim@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("rahim"));
        assert!(is_valid_email("  karim.uddin@mail.example.com.bd "));
        assert!(!is_valid_email("rahim@example."));
        assert!(!is_valid_email("ra him@example.com"));
        assert!(!is_valid_email("rahim@@example.com"));
    }

    #[test]
    fn slug_falls_back_to_id_prefix() {
        assert_eq!(slug_or_id("Eid Collection", "abc"), "eid-collection");
        assert_eq!(slug_or_id("ঈদ", "1f2e3d4c-0000"), "1f2e3d4c");
    }

    #[test]
    fn money_rounding() {
        assert_eq!(round_money(10.005_1), 10.01);
        assert_eq!(round_money(99.994), 99.99);
    }
}
