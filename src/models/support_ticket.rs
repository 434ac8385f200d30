use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result};
use crate::util::require_fields;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub content: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    #[serde(default)]
    pub admin_response: Option<String>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-submitted ticket. Priority arrives as free text so an unknown value
/// is reported as a validation error rather than a parse failure.
#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub priority: Option<String>,
}

impl TicketRequest {
    pub fn validate(&self) -> Result<TicketPriority> {
        require_fields(&[
            ("subject", self.subject.as_deref()),
            ("content", self.content.as_deref()),
        ])?;
        match self.priority.as_deref().map(str::trim) {
            None | Some("") => Ok(TicketPriority::default()),
            Some(p) => p
                .to_lowercase()
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid priority: {}", p))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTicket {
    pub user_id: String,
    pub subject: String,
    pub content: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
}

/// Admin response/status change.
#[derive(Debug, Deserialize)]
pub struct TicketResponse {
    pub admin_response: Option<String>,
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub updated_at: DateTime<Utc>,
}

impl TicketResponse {
    pub fn into_patch(self, now: DateTime<Utc>) -> Result<TicketPatch> {
        let admin_response = self
            .admin_response
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if admin_response.is_none() && self.status.is_none() {
            return Err(AppError::BadRequest(
                "Provide admin_response or status".into(),
            ));
        }
        Ok(TicketPatch {
            responded_at: admin_response.as_ref().map(|_| now),
            admin_response,
            status: self.status,
            updated_at: now,
        })
    }
}
