use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::Package;

#[derive(Serialize)]
pub struct PackageList {
    pub packages: Vec<Package>,
}

#[derive(Serialize)]
pub struct PackageResponse {
    pub package: Package,
}

/// Storefront listing: active packages in display order.
pub async fn list_packages(State(state): State<AppState>) -> Result<Json<PackageList>> {
    let packages = queries::list_active_packages(&state.db).await?;
    Ok(Json(PackageList { packages }))
}

pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PackageResponse>> {
    let package = queries::get_active_package(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".into()))?;
    Ok(Json(PackageResponse { package }))
}
