//! Payment gateway webhook handler.
//!
//! The gateway reports payment outcomes asynchronously. Confirmation
//! credits the pending purchase; failure voids it. Redelivered events are
//! acknowledged without a second effect so the gateway stops retrying.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use nocta_ledger::LedgerError;

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::ApiError;
use crate::state::AppState;

/// Payment webhook payload.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    /// Event type: `payment.confirmed` or `payment.failed`.
    pub event_type: String,
    /// Gateway event ID.
    pub event_id: String,
    /// The payment reference issued at initiation.
    pub payment_ref: String,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle payment gateway webhooks.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify the signature when a secret is configured.
    if let Some(secret) = &state.config.gateway_webhook_secret {
        let signature = headers
            .get("x-nocta-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".into()))?;

        let expected = hmac_sha256_hex(secret, &body);
        if !constant_time_eq(signature, &expected) {
            tracing::warn!("Invalid webhook signature");
            return Err(ApiError::BadRequest("Invalid webhook signature".into()));
        }
    } else {
        tracing::warn!("Gateway webhook secret not configured - skipping signature verification");
    }

    let webhook: PaymentWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.event_id,
        payment_ref = %webhook.payment_ref,
        "Received payment webhook"
    );

    let result = match webhook.event_type.as_str() {
        "payment.confirmed" => state.processor.on_payment_confirmed(&webhook.payment_ref),
        "payment.failed" => state.processor.on_payment_failed(&webhook.payment_ref),
        other => {
            tracing::debug!(event_type = %other, "Unhandled payment event");
            return Ok(Json(WebhookResponse { received: true }));
        }
    };

    match result {
        Ok(_) => Ok(Json(WebhookResponse { received: true })),
        // Redelivery: the purchase is already settled. Acknowledge so the
        // gateway stops retrying; the first delivery did the work.
        Err(LedgerError::AlreadyProcessed { id }) => {
            tracing::debug!(transaction = %id, "Webhook redelivery ignored");
            Ok(Json(WebhookResponse { received: true }))
        }
        Err(err) => Err(err.into()),
    }
}
