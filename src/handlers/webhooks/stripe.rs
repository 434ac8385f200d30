use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::fulfillment::{FulfillmentOutcome, record_purchases_for_session};
use crate::payments::{StripeCheckoutSession, StripeWebhookEvent};

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Signed payment events. Nothing is read or written before the signature
/// over the raw body checks out.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".into()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid signature header".into()))?;

    if !state.stripe.verify_webhook_signature(&body, signature)? {
        tracing::warn!("Stripe webhook rejected: signature mismatch");
        return Err(AppError::BadRequest("Invalid signature".into()));
    }

    let event: StripeWebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse Stripe webhook: {}", e);
        AppError::BadRequest("Invalid JSON".into())
    })?;

    match event.event_type.as_str() {
        "checkout.session.completed" => handle_checkout_completed(&state, &event).await?,
        other => {
            tracing::info!(event_type = other, event_id = ?event.id, "Stripe event ignored");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

async fn handle_checkout_completed(state: &AppState, event: &StripeWebhookEvent) -> Result<()> {
    let session: StripeCheckoutSession = serde_json::from_value(event.data.object.clone())
        .map_err(|e| {
            tracing::error!("Failed to parse checkout session: {}", e);
            AppError::BadRequest("Invalid checkout session".into())
        })?;

    if !session.is_paid() {
        tracing::info!(
            session_id = %session.id,
            payment_status = %session.payment_status,
            "Checkout completed without payment, skipping"
        );
        return Ok(());
    }

    match record_purchases_for_session(state, &session).await? {
        FulfillmentOutcome::AlreadyRecorded => {}
        FulfillmentOutcome::Recorded { count } => {
            tracing::info!(session_id = %session.id, count, "Checkout fulfilled");
        }
    }
    Ok(())
}
