//! Bulk email via the Resend batch API.
//!
//! Recipients are partitioned into batches of [`BATCH_SIZE`] and sent one
//! batch per provider call, sequentially. The first failing batch aborts the
//! run; batches already accepted stay sent.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Recipients per provider call.
pub const BATCH_SIZE: usize = 50;

/// One message in a Resend batch request. Each recipient gets their own
/// message so addresses are never disclosed to each other.
#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendBatchResponse {
    #[serde(default)]
    data: Vec<ResendEmailId>,
}

#[derive(Debug, Deserialize)]
struct ResendEmailId {
    #[allow(dead_code)]
    id: String,
}

/// Outcome of a completed bulk send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkSendReport {
    pub sent: usize,
    pub batches: usize,
}

#[derive(Clone)]
pub struct EmailService {
    api_key: Option<String>,
    api_base: String,
    from_email: String,
    http_client: Client,
}

impl EmailService {
    pub fn new(api_key: Option<String>, api_base: String, from_email: String) -> Self {
        Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            from_email,
            http_client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `subject`/`html` to every recipient, [`BATCH_SIZE`] per call.
    pub async fn send_bulk(
        &self,
        subject: &str,
        html: &str,
        recipients: Vec<String>,
    ) -> Result<BulkSendReport> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("No Resend API key configured, cannot send bulk email");
            return Err(AppError::Dispatch("Email sending is not configured".into()));
        };

        let batches = partition_recipients(recipients);
        let total_batches = batches.len();
        let mut sent = 0;

        for (index, batch) in batches.iter().enumerate() {
            if let Err(e) = self.send_batch(api_key, subject, html, batch).await {
                tracing::error!(
                    batch = index + 1,
                    total_batches,
                    sent,
                    error = %e,
                    "Bulk email aborted"
                );
                return Err(AppError::Dispatch(format!(
                    "Failed to send batch {} of {} ({} recipients already sent)",
                    index + 1,
                    total_batches,
                    sent
                )));
            }
            sent += batch.len();
            tracing::info!(
                batch = index + 1,
                total_batches,
                recipients = batch.len(),
                "Bulk email batch sent"
            );
        }

        Ok(BulkSendReport {
            sent,
            batches: total_batches,
        })
    }

    async fn send_batch(
        &self,
        api_key: &str,
        subject: &str,
        html: &str,
        batch: &[String],
    ) -> Result<()> {
        let messages: Vec<ResendEmailRequest<'_>> = batch
            .iter()
            .map(|to| ResendEmailRequest {
                from: &self.from_email,
                to: vec![to.as_str()],
                subject,
                html,
            })
            .collect();

        let response = self
            .http_client
            .post(format!("{}/emails/batch", self.api_base))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&messages)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Email service error: {}", e)))?;

        if response.status().is_success() {
            let result: ResendBatchResponse = response
                .json()
                .await
                .map_err(|e| AppError::Upstream(format!("Email service response error: {}", e)))?;
            tracing::debug!(accepted = result.data.len(), "Resend accepted batch");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Upstream(format!(
                "Email service error: {} - {}",
                status, body
            )))
        }
    }
}

/// Trim, drop blanks, de-duplicate case-insensitively (first spelling wins),
/// and split into batches of [`BATCH_SIZE`].
pub fn partition_recipients(recipients: Vec<String>) -> Vec<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let unique: Vec<String> = recipients
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty() && seen.insert(r.to_lowercase()))
        .collect();

    unique.chunks(BATCH_SIZE).map(|c| c.to_vec()).collect()
}
