use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::{UpdateProfile, UserSummary};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ProfileResponse>> {
    let user = state.db.get_user(&ctx.access_token).await?;
    Ok(Json(ProfileResponse {
        user: UserSummary::from(&user),
    }))
}

/// Update the display name, acting with the caller's own token.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<ProfileResponse>> {
    let full_name = input
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::missing_field("full_name"))?;

    let user = state
        .db
        .update_user_metadata(
            &ctx.access_token,
            serde_json::json!({ "full_name": full_name }),
        )
        .await?;

    tracing::info!(user_id = %ctx.user_id, "Profile updated");
    Ok(Json(ProfileResponse {
        user: UserSummary::from(&user),
    }))
}
