/// Ticket endpoints
///
/// Every handler resolves the ticket's board through the access gate before
/// touching the ticket. Responses use the `{ "ticket": ... }` and
/// `{ "tickets": [...] }` envelopes with user and blocker references resolved.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tickettrack_shared::{
    auth::{
        authorization::{authorize, Capability},
        middleware::AuthContext,
    },
    models::{
        ticket::{CreateTicket, TicketFilter, TicketPatch},
        view::TicketView,
    },
    services::tickets,
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub board_id: Uuid,

    #[serde(flatten)]
    pub ticket: CreateTicket,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket: TicketView,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketResponse>)> {
    let Json(req) = payload?;
    let store = state.store();

    let ctx = authorize(store, &auth.user, req.board_id, Capability::Write).await?;
    let ticket = tickets::create(store, &ctx, &auth.user, req.ticket).await?;
    let ticket = tickets::ticket_view(store, &ctx.board, ticket).await?;

    Ok((StatusCode::CREATED, Json(TicketResponse { ticket })))
}

/// Lists a board's tickets, newest first, filtered by query parameters
pub async fn list_board_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    filter: Result<Query<TicketFilter>, QueryRejection>,
) -> ApiResult<Json<TicketListResponse>> {
    let Query(filter) = filter.map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))?;
    let store = state.store();

    let ctx = authorize(store, &auth.user, board_id, Capability::Read).await?;
    let list = tickets::list_by_board(store, &ctx, &filter).await?;
    let tickets = tickets::ticket_views(store, &ctx.board, list).await?;

    Ok(Json(TicketListResponse { tickets }))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
) -> ApiResult<Json<TicketResponse>> {
    let store = state.store();

    let (ticket, ctx) = tickets::load(store, &auth.user, ticket_id, Capability::Read).await?;
    let ticket = tickets::ticket_view(store, &ctx.board, ticket).await?;

    Ok(Json(TicketResponse { ticket }))
}

/// Applies a partial update
///
/// A body carrying only `status` is a column move and goes through
/// `transition_status`.
pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
    payload: Result<Json<TicketPatch>, JsonRejection>,
) -> ApiResult<Json<TicketResponse>> {
    let Json(patch) = payload?;
    let store = state.store();

    let (ticket, ctx) = tickets::load(store, &auth.user, ticket_id, Capability::Write).await?;

    let ticket = match patch.status {
        Some(status) if patch == TicketPatch::status(status) => {
            tickets::transition_status(store, &ctx, ticket, status).await?
        }
        _ => tickets::update(store, &ctx, ticket, patch).await?,
    };
    let ticket = tickets::ticket_view(store, &ctx.board, ticket).await?;

    Ok(Json(TicketResponse { ticket }))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let store = state.store();

    let (ticket, ctx) = tickets::load(store, &auth.user, ticket_id, Capability::Write).await?;
    tickets::delete(store, &ctx, &ticket, &auth.user).await?;

    Ok(Json(MessageResponse {
        message: "Ticket deleted".to_string(),
    }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketResponse>)> {
    let Json(req) = payload?;
    let store = state.store();

    let (mut ticket, ctx) = tickets::load(store, &auth.user, ticket_id, Capability::Write).await?;
    let comment = tickets::add_comment(store, &ticket, &auth.user, &req.text).await?;
    ticket.comments.push(comment);

    let ticket = tickets::ticket_view(store, &ctx.board, ticket).await?;

    Ok((StatusCode::CREATED, Json(TicketResponse { ticket })))
}
