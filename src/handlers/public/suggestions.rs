use axum::{extract::State, http::HeaderMap};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::authenticate_user;
use crate::models::{CreateSuggestion, Suggestion, SuggestionRequest};

#[derive(Serialize)]
pub struct SuggestionCreated {
    pub suggestion: Suggestion,
}

/// Anyone may leave a suggestion; a signed-in caller is attached to it.
pub async fn create_suggestion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SuggestionRequest>,
) -> Result<Json<SuggestionCreated>> {
    input.validate()?;
    let user_id = authenticate_user(&state, &headers).map(|ctx| ctx.user_id);

    let suggestion = queries::create_suggestion(
        &state.db,
        &CreateSuggestion {
            package_id: input.package_id.unwrap_or_default().trim().to_string(),
            user_id,
            content: input.content.unwrap_or_default().trim().to_string(),
        },
    )
    .await?;

    tracing::info!(
        suggestion_id = %suggestion.id,
        package_id = %suggestion.package_id,
        "Suggestion received"
    );
    Ok(Json(SuggestionCreated { suggestion }))
}
