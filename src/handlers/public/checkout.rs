use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::payments::{CartItem, CheckoutParams};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub customer_email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// Create a hosted payment session for the cart.
///
/// Only emptiness is checked locally; line item problems come back from
/// the provider and surface as a generic 500.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if input.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let base_url = &state.config.base_url;
    let success_url = input
        .success_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", base_url));
    let cancel_url = input
        .cancel_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("{}/cart", base_url));
    let customer_email = input
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let (session_id, url) = state
        .stripe
        .create_checkout_session(&CheckoutParams {
            items: &input.items,
            customer_email,
            currency: &state.config.default_currency,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    tracing::info!(session_id = %session_id, items = input.items.len(), "Checkout session created");
    Ok(Json(CheckoutResponse { session_id, url }))
}
