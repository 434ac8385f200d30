use axum::extract::State;
use serde::Deserialize;

use crate::db::AppState;
use crate::email::BulkSendReport;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::util::require_fields;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub subject: Option<String>,
    pub html: Option<String>,
    /// Defaults to every user with an email address
    pub recipients: Option<Vec<String>>,
}

/// Explicit recipients, or every auth user that has an email.
pub async fn resolve_recipients(
    state: &AppState,
    explicit: Option<Vec<String>>,
) -> Result<Vec<String>> {
    match explicit {
        Some(list) if !list.is_empty() => Ok(list),
        _ => {
            let users = state.db.list_all_users().await?;
            Ok(users
                .into_iter()
                .filter_map(|u| u.email)
                .filter(|e| !e.trim().is_empty())
                .collect())
        }
    }
}

pub async fn send_email(
    State(state): State<AppState>,
    Json(input): Json<SendEmailRequest>,
) -> Result<Json<BulkSendReport>> {
    require_fields(&[
        ("subject", input.subject.as_deref()),
        ("html", input.html.as_deref()),
    ])?;

    let recipients = resolve_recipients(&state, input.recipients).await?;
    if recipients.is_empty() {
        return Err(AppError::BadRequest("No recipients".into()));
    }

    let report = state
        .email
        .send_bulk(
            input.subject.as_deref().unwrap_or_default(),
            input.html.as_deref().unwrap_or_default(),
            recipients,
        )
        .await?;

    tracing::info!(sent = report.sent, batches = report.batches, "Bulk email sent");
    Ok(Json(report))
}
