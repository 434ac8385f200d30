use axum::extract::{Extension, State};
use chrono::Utc;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::handlers::account::TicketList;
use crate::middleware::UserContext;
use crate::models::{SupportTicket, TicketResponse};

#[derive(Serialize)]
pub struct TicketUpdated {
    pub ticket: SupportTicket,
}

pub async fn list_all_tickets(State(state): State<AppState>) -> Result<Json<TicketList>> {
    let tickets = queries::list_all_tickets(&state.db).await?;
    Ok(Json(TicketList { tickets }))
}

/// Record an admin response and/or move the ticket to a new status.
pub async fn respond_to_ticket(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<TicketResponse>,
) -> Result<Json<TicketUpdated>> {
    let patch = input.into_patch(Utc::now())?;
    let ticket = queries::update_ticket(&state.db, &id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".into()))?;

    tracing::info!(
        ticket_id = %ticket.id,
        status = ticket.status.as_ref(),
        responded = patch.admin_response.is_some(),
        admin = %ctx.email(),
        "Support ticket updated"
    );
    Ok(Json(TicketUpdated { ticket }))
}
