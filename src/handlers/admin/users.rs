use axum::extract::State;
use serde::Serialize;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::models::UserSummary;

#[derive(Serialize)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserList>> {
    let users = state.db.list_all_users().await?;
    Ok(Json(UserList {
        users: users.iter().map(UserSummary::from).collect(),
    }))
}
