use axum::extract::{Extension, State};
use serde::Deserialize;

use super::Deleted;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::handlers::account::{ProgramList, ProgramResponse};
use crate::middleware::UserContext;
use crate::models::ProgramInput;
use crate::programs;

#[derive(Debug, Deserialize)]
pub struct ProgramFilter {
    pub user_id: Option<String>,
}

pub async fn list_programs(
    State(state): State<AppState>,
    Query(filter): Query<ProgramFilter>,
) -> Result<Json<ProgramList>> {
    let user_id = filter.user_id.as_deref().filter(|u| !u.is_empty());
    let rows = queries::list_programs(&state.db, user_id).await?;
    let programs = programs::load_trees(&state.db, rows).await?;
    Ok(Json(ProgramList { programs }))
}

pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProgramResponse>> {
    let program = queries::get_program(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))?;
    let program = programs::load_tree(&state.db, program).await?;
    Ok(Json(ProgramResponse { program }))
}

pub async fn create_program(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<ProgramInput>,
) -> Result<Json<ProgramResponse>> {
    input.validate_create()?;
    let program = programs::create_program(&state.db, &input).await?;
    tracing::debug!(program_id = %program.id, admin = %ctx.email(), "Program created by admin");
    Ok(Json(ProgramResponse { program }))
}

/// Update fields and reconcile workouts/exercises by id.
pub async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProgramInput>,
) -> Result<Json<ProgramResponse>> {
    input.validate_update()?;
    let program = programs::update_program(&state.db, &id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))?;
    Ok(Json(ProgramResponse { program }))
}

pub async fn delete_program(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    if !programs::delete_program(&state.db, &id).await? {
        return Err(AppError::NotFound("Program not found".into()));
    }
    tracing::info!(program_id = %id, admin = %ctx.email(), "Program deleted");
    Ok(Json(Deleted { success: true }))
}
