use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::util::extract_access_token;

/// Identity of the signed-in caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub email: Option<String>,
    /// Raw token, forwarded when acting on the caller's own auth record
    pub access_token: String,
}

impl UserContext {
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// Authenticate the caller from a bearer token or session cookie.
pub fn authenticate_user(state: &AppState, headers: &HeaderMap) -> Option<UserContext> {
    let token = extract_access_token(headers)?;
    let user = state.db.verify_access_token(&token)?;
    Some(UserContext {
        user_id: user.id,
        email: user.email,
        access_token: token,
    })
}

pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = authenticate_user(&state, request.headers()).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
