pub mod account;
pub mod admin;
pub mod auth;
pub mod public;
pub mod webhooks;

use axum::{Router, http::StatusCode};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::db::AppState;
use crate::error::AppError;
use crate::extractors::Json;

async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

async fn method_not_allowed() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .merge(public::router())
        .merge(webhooks::router())
        .merge(auth::router())
        .merge(account::router(state.clone()))
        .merge(admin::router(state.clone()))
        .method_not_allowed_fallback(method_not_allowed);

    let router = match &state.config.static_dir {
        Some(dir) => {
            let index = format!("{}/index.html", dir.trim_end_matches('/'));
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
