use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util::require_fields;

/// Free-text feedback on a package. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub package_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub package_id: Option<String>,
    pub content: Option<String>,
}

impl SuggestionRequest {
    pub fn validate(&self) -> Result<()> {
        require_fields(&[
            ("package_id", self.package_id.as_deref()),
            ("content", self.content.as_deref()),
        ])
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSuggestion {
    pub package_id: String,
    pub user_id: Option<String>,
    pub content: String,
}
