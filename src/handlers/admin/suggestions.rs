use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::Suggestion;

#[derive(Serialize)]
pub struct SuggestionList {
    pub suggestions: Vec<Suggestion>,
}

pub async fn list_suggestions(State(state): State<AppState>) -> Result<Json<SuggestionList>> {
    let suggestions = queries::list_suggestions(&state.db).await?;
    Ok(Json(SuggestionList { suggestions }))
}
