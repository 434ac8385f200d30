use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::fulfillment::{FulfillmentOutcome, record_purchases_for_session};
use crate::util::require_fields;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchases: Option<usize>,
}

/// Re-derive purchases for a session whose webhook never arrived.
///
/// Development only; production relies on the webhook.
pub async fn reconcile_purchase(
    State(state): State<AppState>,
    Json(input): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>> {
    if state.config.production {
        return Err(AppError::Forbidden(
            "Reconciliation is disabled in production".into(),
        ));
    }
    require_fields(&[("sessionId", input.session_id.as_deref())])?;
    let session_id = input.session_id.unwrap_or_default();
    let session_id = session_id.trim();

    if queries::find_purchase_by_session(&state.db, session_id)
        .await?
        .is_some()
    {
        return Ok(Json(ReconcileResponse {
            status: "already_exists",
            purchases: None,
        }));
    }

    let session = state.stripe.retrieve_checkout_session(session_id).await?;
    if !session.is_paid() {
        return Err(AppError::BadRequest(format!(
            "Session is not paid (payment_status: {})",
            session.payment_status
        )));
    }

    let response = match record_purchases_for_session(&state, &session).await? {
        FulfillmentOutcome::AlreadyRecorded => ReconcileResponse {
            status: "already_exists",
            purchases: None,
        },
        FulfillmentOutcome::Recorded { count } => {
            tracing::info!(session_id = %session.id, count, "Session reconciled");
            ReconcileResponse {
                status: "created",
                purchases: Some(count),
            }
        }
    };
    Ok(Json(response))
}
