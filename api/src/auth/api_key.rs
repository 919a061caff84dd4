//! Admin API key authentication
//!
//! Admin routes take an [`AdminAccess`] argument. The key is compared by
//! SHA-256 digest, so the plaintext never sits in `AppState`.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::AppState;

/// Hash an API key for comparison
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the API key from the Authorization header
fn extract_api_key(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Proof that the request carried the admin key.
///
/// With no key configured every request is let through; startup logs a
/// warning in that case.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_key_hash.as_deref() else {
            return Ok(AdminAccess);
        };

        let api_key = extract_api_key(parts).ok_or(AppError::Unauthorized)?;
        if hash_api_key(api_key) != expected {
            tracing::warn!(path = %parts.uri.path(), "Rejected request with invalid admin key");
            return Err(AppError::Unauthorized);
        }
        Ok(AdminAccess)
    }
}

/// Whether the caller presented a valid admin key; never rejects.
///
/// Storefront requests carry no key and see `AdminView(false)`, even when no
/// admin key is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminView(pub bool);

#[async_trait]
impl FromRequestParts<AppState> for AdminView {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let granted = match (extract_api_key(parts), state.admin_key_hash.as_deref()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(api_key), Some(expected)) => hash_api_key(api_key) == expected,
        };
        Ok(AdminView(granted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn hashing_is_stable_hex() {
        let hash = hash_api_key("test-admin-key");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("test-admin-key"));
        assert_ne!(hash, hash_api_key("other"));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let (parts, _) = Request::builder()
            .header("Authorization", "Bearer secret")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_api_key(&parts), Some("secret"));

        let (parts, _) = Request::builder()
            .header("Authorization", "Basic secret")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_api_key(&parts), None);
    }
}
