//! Session bridge between the managed auth provider and browser cookies.

use axum::{
    Router,
    extract::State,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;

use crate::db::AppState;
use crate::extractors::Query;
use crate::util::{
    ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE, REFRESH_TOKEN_COOKIE, UPSTREAM_TIMEOUT,
    with_timeout,
};

const DEFAULT_NEXT: &str = "/dashboard";
const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/callback", get(auth_callback))
        .route("/auth/signout", post(sign_out))
}

/// Only same-site absolute paths are followed after sign-in.
pub fn safe_next_path(next: Option<&str>) -> &str {
    match next {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('\\') => p,
        _ => DEFAULT_NEXT,
    }
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Exchange the authorization code for a session and set the session cookies.
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!("Auth callback without a code");
        return (jar, Redirect::to(AUTH_ERROR_PATH));
    };

    let verifier = jar.get(CODE_VERIFIER_COOKIE).map(|c| c.value().to_string());
    let exchange = with_timeout(
        UPSTREAM_TIMEOUT,
        "auth code exchange",
        state.db.exchange_code_for_session(code, verifier.as_deref()),
    )
    .await;

    let session = match exchange {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Auth code exchange failed");
            return (jar, Redirect::to(AUTH_ERROR_PATH));
        }
    };

    if let Some(user) = &session.user {
        tracing::info!(user_id = %user.id, "User signed in");
    }

    let secure = state.config.production;
    let jar = jar
        .remove(removal(CODE_VERIFIER_COOKIE))
        .add(session_cookie(ACCESS_TOKEN_COOKIE, session.access_token, secure))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token, secure));

    (jar, Redirect::to(safe_next_path(query.next.as_deref())))
}

pub async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar
        .remove(removal(ACCESS_TOKEN_COOKIE))
        .remove(removal(REFRESH_TOKEN_COOKIE));
    (jar, Redirect::to("/"))
}
