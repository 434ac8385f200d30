use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{CreateTicket, SupportTicket, TicketRequest, TicketStatus};

#[derive(Serialize)]
pub struct TicketList {
    pub tickets: Vec<SupportTicket>,
}

#[derive(Serialize)]
pub struct TicketCreated {
    pub ticket: SupportTicket,
}

#[derive(Serialize)]
pub struct TicketDeleted {
    pub success: bool,
}

pub async fn list_my_tickets(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<TicketList>> {
    let tickets = queries::list_tickets_for_user(&state.db, &ctx.user_id).await?;
    Ok(Json(TicketList { tickets }))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<TicketRequest>,
) -> Result<Json<TicketCreated>> {
    let priority = input.validate()?;

    let ticket = queries::create_ticket(
        &state.db,
        &CreateTicket {
            user_id: ctx.user_id.clone(),
            subject: input.subject.unwrap_or_default().trim().to_string(),
            content: input.content.unwrap_or_default().trim().to_string(),
            priority,
            status: TicketStatus::Open,
        },
    )
    .await?;

    tracing::info!(
        ticket_id = %ticket.id,
        user_id = %ctx.user_id,
        priority = priority.as_ref(),
        "Support ticket opened"
    );
    Ok(Json(TicketCreated { ticket }))
}

/// Delete scoped to the caller. A ticket that is missing or owned by someone
/// else is answered the same way as a real delete.
pub async fn delete_my_ticket(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<TicketDeleted>> {
    let deleted = queries::delete_ticket_for_user(&state.db, &id, &ctx.user_id).await?;
    if deleted {
        tracing::info!(ticket_id = %id, user_id = %ctx.user_id, "Support ticket deleted");
    } else {
        tracing::warn!(
            ticket_id = %id,
            user_id = %ctx.user_id,
            "Ticket delete matched no owned row"
        );
    }
    Ok(Json(TicketDeleted { success: true }))
}
