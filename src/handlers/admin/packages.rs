use axum::extract::{Extension, State};

use super::Deleted;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::handlers::public::{PackageList, PackageResponse};
use crate::middleware::UserContext;
use crate::models::{CreatePackage, UpdatePackage};

/// Every package, inactive ones included.
pub async fn list_all_packages(State(state): State<AppState>) -> Result<Json<PackageList>> {
    let packages = queries::list_all_packages(&state.db).await?;
    Ok(Json(PackageList { packages }))
}

pub async fn create_package(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreatePackage>,
) -> Result<Json<PackageResponse>> {
    input.validate()?;
    let package = queries::create_package(&state.db, &input).await?;
    tracing::info!(package_id = %package.id, admin = %ctx.email(), "Package created");
    Ok(Json(PackageResponse { package }))
}

pub async fn update_package(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePackage>,
) -> Result<Json<PackageResponse>> {
    input.validate()?;
    let package = queries::update_package(&state.db, &id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".into()))?;
    tracing::info!(package_id = %package.id, admin = %ctx.email(), "Package updated");
    Ok(Json(PackageResponse { package }))
}

pub async fn delete_package(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    if !queries::delete_package(&state.db, &id).await? {
        return Err(AppError::NotFound("Package not found".into()));
    }
    tracing::info!(package_id = %id, admin = %ctx.email(), "Package deleted");
    Ok(Json(Deleted { success: true }))
}
