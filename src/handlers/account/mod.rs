mod custom_programs;
mod profile;
mod purchases;
mod support_tickets;

pub use custom_programs::*;
pub use profile::*;
pub use purchases::*;
pub use support_tickets::*;

use axum::{
    Router, middleware,
    routing::{delete, get},
};

use crate::db::AppState;
use crate::middleware::user_auth;

/// Routes for the signed-in customer. Everything is scoped to the caller.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/purchases", get(list_my_purchases))
        .route(
            "/api/support-tickets",
            get(list_my_tickets).post(create_ticket),
        )
        .route("/api/support-tickets/{id}", delete(delete_my_ticket))
        .route("/api/custom-programs", get(list_my_programs))
        .route("/api/custom-programs/{id}", get(get_my_program))
        .layer(middleware::from_fn_with_state(state, user_auth))
}
