use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook before it is treated as a replay.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Line items fetched per page.
const LINE_ITEMS_PAGE: usize = 100;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// `https://api.stripe.com` outside tests
    pub api_base: String,
}

/// One line of the customer's cart, prices in major units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Parameters for a hosted payment session.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    pub items: &'a [CartItem],
    pub customer_email: Option<&'a str>,
    pub currency: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl StripeCheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// Customer email, preferring what the customer entered at checkout.
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
            .filter(|e| !e.is_empty())
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeLineItem {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount_total: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LineItemList {
    data: Vec<StripeLineItem>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a hosted checkout session. Returns (session_id, checkout_url).
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<(String, String)> {
        let form = checkout_form(params);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Stripe API error: {}", error_text)));
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Stripe response: {}", e)))?;

        let url = session
            .url
            .ok_or_else(|| AppError::Upstream("Stripe session has no URL".into()))?;

        Ok((session.id, url))
    }

    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<StripeCheckoutSession> {
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.api_base,
                urlencoding::encode(session_id)
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe API error: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Checkout session not found".into()));
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Stripe API error: {}", error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Stripe session: {}", e)))
    }

    /// All line items of a session, following pagination.
    pub async fn list_line_items(&self, session_id: &str) -> Result<Vec<StripeLineItem>> {
        let mut items: Vec<StripeLineItem> = Vec::new();
        loop {
            let mut query = vec![("limit".to_string(), LINE_ITEMS_PAGE.to_string())];
            if let Some(last) = items.last() {
                query.push(("starting_after".to_string(), last.id.clone()));
            }

            let response = self
                .client
                .get(format!(
                    "{}/v1/checkout/sessions/{}/line_items",
                    self.api_base,
                    urlencoding::encode(session_id)
                ))
                .bearer_auth(&self.secret_key)
                .query(&query)
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("Stripe API error: {}", e)))?;

            if !response.status().is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(AppError::Upstream(format!("Stripe API error: {}", error_text)));
            }

            let page: LineItemList = response
                .json()
                .await
                .map_err(|e| AppError::Upstream(format!("Failed to parse line items: {}", e)))?;

            let has_more = page.has_more && !page.data.is_empty();
            items.extend(page.data);
            if !has_more {
                return Ok(items);
            }
        }
    }

    /// Verify a `stripe-signature` header (`t=...,v1=...`) against the raw body.
    ///
    /// Ok(false) for a wrong or stale signature; Err for a malformed header.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<bool> {
        self.verify_webhook_signature_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    pub fn verify_webhook_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<bool> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", v)) => timestamp = Some(v),
                Some(("v1", v)) => signatures.push(v),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::BadRequest("Missing timestamp in signature".into()))?;
        if signatures.is_empty() {
            return Err(AppError::BadRequest("Missing v1 signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid signature timestamp".into()))?;
        if now.abs_diff(ts) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
            return Ok(false);
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        Ok(signatures
            .iter()
            .any(|sig| bool::from(expected.as_bytes().ct_eq(sig.as_bytes()))))
    }
}

/// Form-encoded body for `POST /v1/checkout/sessions`.
pub fn checkout_form(params: &CheckoutParams<'_>) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), params.success_url.to_string()),
        ("cancel_url".to_string(), params.cancel_url.to_string()),
    ];
    if let Some(email) = params.customer_email {
        form.push(("customer_email".to_string(), email.to_string()));
    }

    for (i, item) in params.items.iter().enumerate() {
        let prefix = format!("line_items[{}]", i);
        form.push((
            format!("{}[price_data][currency]", prefix),
            params.currency.to_string(),
        ));
        form.push((
            format!("{}[price_data][unit_amount]", prefix),
            to_minor_units(item.price).to_string(),
        ));
        form.push((
            format!("{}[price_data][product_data][name]", prefix),
            item.name.clone(),
        ));
        if let Some(desc) = item.description.as_deref().filter(|d| !d.is_empty()) {
            form.push((
                format!("{}[price_data][product_data][description]", prefix),
                desc.to_string(),
            ));
        }
        for (j, image) in item.images.iter().enumerate() {
            form.push((
                format!("{}[price_data][product_data][images][{}]", prefix, j),
                image.clone(),
            ));
        }
        form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }

    form
}

/// Major units to minor units, rounding to the nearest unit.
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}
