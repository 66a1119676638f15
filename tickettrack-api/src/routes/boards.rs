/// Board endpoints
///
/// Responses wrap the resource in an envelope: `{ "board": ... }`,
/// `{ "boards": [...] }`, `{ "invitation": ... }`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
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
        board::{CreateBoard, Invitation},
        view::BoardView,
    },
    services::{boards, membership},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub board: BoardView,
}

#[derive(Debug, Serialize)]
pub struct BoardListResponse {
    pub boards: Vec<BoardView>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub invitation: Invitation,
}

/// Body of both invite and accept-invitation
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateBoard>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BoardResponse>)> {
    let Json(data) = payload?;
    let store = state.store();

    let board = boards::create_board(store, &auth.user, data).await?;
    let board = boards::board_view(store, board, auth.user_id()).await?;

    Ok((StatusCode::CREATED, Json(BoardResponse { board })))
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BoardListResponse>> {
    let store = state.store();

    let list = boards::list_for_user(store, &auth.user).await?;
    let boards = boards::board_views(store, list, auth.user_id()).await?;

    Ok(Json(BoardListResponse { boards }))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardResponse>> {
    let store = state.store();

    let ctx = authorize(store, &auth.user, board_id, Capability::Read).await?;
    let board = boards::board_view(store, ctx.board, auth.user_id()).await?;

    Ok(Json(BoardResponse { board }))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    let Json(req) = payload?;
    let store = state.store();

    let ctx = authorize(store, &auth.user, board_id, Capability::Invite).await?;
    req.validate().map_err(ApiError::from_validation)?;
    let invitation = membership::invite(store, &ctx, &auth.user, &req.email).await?;

    Ok((StatusCode::CREATED, Json(InvitationResponse { invitation })))
}

/// Accepts an invitation addressed to the caller
///
/// No gate here: the caller is not a member yet.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<Json<BoardResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;
    let store = state.store();

    let board = membership::accept_invitation(store, &auth.user, board_id, &req.email).await?;
    let board = boards::board_view(store, board, auth.user_id()).await?;

    Ok(Json(BoardResponse { board }))
}
