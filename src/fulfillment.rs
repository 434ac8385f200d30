//! Recording purchases for a paid checkout session.
//!
//! Shared by the webhook and the reconciliation endpoint. The session id is
//! the dedup key: a session that already has any purchase row is left alone.

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::models::{CreatePurchase, PURCHASE_STATUS_COMPLETED};
use crate::payments::{StripeCheckoutSession, StripeLineItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    AlreadyRecorded,
    Recorded { count: usize },
}

/// Insert one purchase per line item of `session`, unless already recorded.
///
/// Failed inserts are logged and skipped, so a session may end up partially
/// recorded; the count reports rows actually written.
pub async fn record_purchases_for_session(
    state: &AppState,
    session: &StripeCheckoutSession,
) -> Result<FulfillmentOutcome> {
    if queries::find_purchase_by_session(&state.db, &session.id)
        .await?
        .is_some()
    {
        tracing::info!(session_id = %session.id, "Purchases already recorded for session");
        return Ok(FulfillmentOutcome::AlreadyRecorded);
    }

    let line_items = state.stripe.list_line_items(&session.id).await?;
    check_session_total(session, &line_items);

    let rows = purchase_rows(session, &line_items, &state.config.default_currency);
    let mut count = 0;
    for row in &rows {
        match queries::insert_purchase(&state.db, row).await {
            Ok(purchase) => {
                count += 1;
                tracing::info!(
                    purchase_id = %purchase.id,
                    session_id = %session.id,
                    package = %purchase.package_name,
                    amount = purchase.amount,
                    currency = %purchase.currency,
                    "Purchase recorded"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session.id,
                    package = %row.package_name,
                    error = %e,
                    "Failed to record purchase"
                );
            }
        }
    }

    Ok(FulfillmentOutcome::Recorded { count })
}

/// Build the purchase rows for a session's line items.
pub fn purchase_rows(
    session: &StripeCheckoutSession,
    line_items: &[StripeLineItem],
    default_currency: &str,
) -> Vec<CreatePurchase> {
    let email = session.email().unwrap_or_default().trim().to_lowercase();
    if email.is_empty() {
        tracing::warn!(session_id = %session.id, "Checkout session has no customer email");
    }

    line_items
        .iter()
        .map(|item| CreatePurchase {
            email: email.clone(),
            name: session.customer_name().map(str::to_string),
            package_name: item.description.clone().unwrap_or_default(),
            amount: item.amount_total,
            currency: item
                .currency
                .as_deref()
                .or(session.currency.as_deref())
                .filter(|c| !c.is_empty())
                .unwrap_or(default_currency)
                .to_lowercase(),
            status: PURCHASE_STATUS_COMPLETED,
            stripe_session_id: session.id.clone(),
            stripe_payment_intent_id: session.payment_intent.clone(),
        })
        .collect()
}

/// Compare line totals with the session total. Returns false on mismatch.
pub fn check_session_total(session: &StripeCheckoutSession, line_items: &[StripeLineItem]) -> bool {
    let Some(expected) = session.amount_total else {
        return true;
    };
    let actual: i64 = line_items.iter().map(|i| i.amount_total).sum();
    if actual != expected {
        tracing::warn!(
            session_id = %session.id,
            expected,
            actual,
            "Line item totals do not match session total"
        );
        return false;
    }
    true
}
