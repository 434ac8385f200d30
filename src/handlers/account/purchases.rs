use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::Purchase;

#[derive(Serialize)]
pub struct PurchaseList {
    pub purchases: Vec<Purchase>,
}

/// Purchases are keyed by checkout email, not user id.
pub async fn list_my_purchases(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<PurchaseList>> {
    if ctx.email().trim().is_empty() {
        return Ok(Json(PurchaseList { purchases: Vec::new() }));
    }
    let purchases = queries::list_purchases_for_email(&state.db, ctx.email()).await?;
    Ok(Json(PurchaseList { purchases }))
}
