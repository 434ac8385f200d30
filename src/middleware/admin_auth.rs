use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::authenticate_user;
use crate::db::AppState;
use crate::error::{AppError, Result};

/// Gate for `/api/admin/*`: a valid session whose email is on the allow-list.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = authenticate_user(&state, request.headers()).ok_or(AppError::Unauthorized)?;
    if !state.config.is_admin_email(ctx.email()) {
        tracing::warn!(user_id = %ctx.user_id, "Non-admin caller rejected from admin route");
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
