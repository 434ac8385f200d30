use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity record as returned by the managed auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
}

impl AuthUser {
    /// Display name from user metadata (`full_name`, then `name`).
    pub fn display_name(&self) -> Option<String> {
        ["full_name", "name"]
            .iter()
            .filter_map(|k| self.user_metadata.get(k))
            .filter_map(|v| v.as_str())
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(String::from)
    }

    pub fn providers(&self) -> Vec<String> {
        if !self.app_metadata.providers.is_empty() {
            return self.app_metadata.providers.clone();
        }
        self.app_metadata.provider.iter().cloned().collect()
    }
}

/// Shape returned to the dashboard and the admin user list.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub providers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<&AuthUser> for UserSummary {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.display_name(),
            providers: user.providers(),
            created_at: user.created_at,
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

/// Session issued by the auth provider after a code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
}
