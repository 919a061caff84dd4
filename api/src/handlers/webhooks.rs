//! Webhook handlers
//!
//! Steadfast pushes delivery status changes here. The endpoint always answers
//! 200 so the courier never retries; failures are logged and dropped.

use axum::{body::Bytes, extract::State, http::HeaderMap};

use crate::app::{WebhookOutcome, WebhookPayload};
use crate::auth::hash_api_key;
use crate::response::ApiResponse;
use crate::AppState;

/// Check the `Authorization: Bearer <token>` header Steadfast sends.
/// Tokens are compared as SHA-256 digests, like admin keys.
fn verify_token(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    let Some(provided) = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    else {
        tracing::warn!("No bearer token provided in webhook request");
        return false;
    };

    hash_api_key(provided.trim()) == hash_api_key(expected)
}

fn acknowledge(message: &str) -> ApiResponse<()> {
    ApiResponse::message(message)
}

/// POST /api/webhooks/steadfast
pub async fn steadfast_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<()> {
    if !verify_token(&headers, state.config.steadfast_webhook_token.as_deref()) {
        tracing::warn!("Webhook token verification failed; ignoring request");
        return acknowledge("Webhook ignored");
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            return acknowledge("Webhook received");
        }
    };

    tracing::info!(
        notification_type = ?payload.notification_type,
        consignment_id = ?payload.consignment_id,
        invoice = ?payload.invoice,
        "Received Steadfast webhook"
    );

    match state.shipments.handle_webhook(&payload).await {
        Ok(WebhookOutcome::Updated) => acknowledge("Order status updated"),
        Ok(WebhookOutcome::Unchanged) => acknowledge("Order status unchanged"),
        Ok(WebhookOutcome::UnknownOrder) => acknowledge("No matching order"),
        Ok(WebhookOutcome::Ignored) => acknowledge("Webhook received"),
        Err(e) => {
            tracing::warn!(error = %e, consignment_id = ?payload.consignment_id, "Webhook processing failed");
            acknowledge("Webhook received")
        }
    }
}
