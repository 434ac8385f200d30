use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::CustomProgram;
use crate::programs;

#[derive(Serialize)]
pub struct ProgramList {
    pub programs: Vec<CustomProgram>,
}

#[derive(Serialize)]
pub struct ProgramResponse {
    pub program: CustomProgram,
}

pub async fn list_my_programs(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ProgramList>> {
    let rows = queries::list_programs(&state.db, Some(&ctx.user_id)).await?;
    let programs = programs::load_trees(&state.db, rows).await?;
    Ok(Json(ProgramList { programs }))
}

pub async fn get_my_program(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<ProgramResponse>> {
    let program = queries::get_program_for_user(&state.db, &id, &ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))?;
    let program = programs::load_tree(&state.db, program).await?;
    Ok(Json(ProgramResponse { program }))
}
