mod checkout;
mod packages;
mod reconcile;
mod suggestions;

pub use checkout::*;
pub use packages::*;
pub use reconcile::*;
pub use suggestions::*;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::extractors::Json;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/packages", get(list_packages))
        .route("/api/packages/{id}", get(get_package))
        .route("/api/suggestions", post(create_suggestion))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/reconcile-purchase", post(reconcile_purchase))
}
