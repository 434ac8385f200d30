mod custom_programs;
mod email;
mod packages;
mod purchases;
mod suggestions;
mod support_tickets;
mod uploads;
mod users;

pub use custom_programs::*;
pub use email::*;
pub use packages::*;
pub use purchases::*;
pub use suggestions::*;
pub use support_tickets::*;
pub use uploads::*;
pub use users::*;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware::require_admin;

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route(
            "/api/admin/packages",
            get(list_all_packages).post(create_package),
        )
        .route(
            "/api/admin/packages/{id}",
            put(update_package).delete(delete_package),
        )
        .route("/api/admin/purchases", get(list_all_purchases))
        .route("/api/admin/support-tickets", get(list_all_tickets))
        .route("/api/admin/support-tickets/{id}", put(respond_to_ticket))
        .route(
            "/api/admin/custom-programs",
            get(list_programs).post(create_program),
        )
        .route(
            "/api/admin/custom-programs/{id}",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route("/api/admin/suggestions", get(list_suggestions))
        .route(
            "/api/admin/upload",
            post(upload_image)
                .delete(delete_image)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/admin/send-email", post(send_email))
        .layer(middleware::from_fn_with_state(state, require_admin))
}
