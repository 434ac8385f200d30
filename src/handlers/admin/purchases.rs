use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::handlers::account::PurchaseList;

pub async fn list_all_purchases(State(state): State<AppState>) -> Result<Json<PurchaseList>> {
    let purchases = queries::list_all_purchases(&state.db).await?;
    Ok(Json(PurchaseList { purchases }))
}
