//! Officiating session handlers: open, inspect, command, record events,
//! roll back and close.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    OpenSessionRequest, PaginationParams, SessionCommand, SessionListResponse, SessionResponse,
    SessionSummaryDto, SubmitEventRequest,
};
use crate::app_state::AppState;
use crate::domain::MatchId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /sessions` — List open sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List open sessions",
    description = "Returns a paginated list of the officiating sessions held by the gateway, ordered by match id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated session list", body = SessionListResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let summaries = state.officiating.list_sessions().await;
    let (page, pagination) = params.paginate(summaries);
    Json(SessionListResponse {
        data: page.into_iter().map(SessionSummaryDto::from).collect(),
        pagination,
    })
}

/// `POST /matches/{id}/session` — Open an officiating session.
///
/// # Errors
///
/// Returns a blocking error (423) when the match cannot be officiated yet,
/// or a backend error if it cannot be loaded.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/session",
    tag = "Sessions",
    summary = "Open a session",
    description = "Loads the match, checks that both participants are assigned, that the previous round is completed and, for a return leg, that the first leg is completed. Opening an already open session returns it unchanged.",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    request_body(content = OpenSessionRequest, description = "Optional clock settings"),
    responses(
        (status = 201, description = "Session opened", body = SessionResponse),
        (status = 200, description = "Session already open", body = SessionResponse),
        (status = 404, description = "Match not found", body = ErrorResponse),
        (status = 423, description = "Prerequisites not met", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<impl IntoResponse, GatewayError> {
    let match_id = MatchId::from(id);
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let existed = state.officiating.view(&match_id).await.is_ok();
    let view = state
        .officiating
        .open_session(&match_id, request.half_duration_minutes)
        .await?;
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(SessionResponse::from(&view))))
}

/// `GET /matches/{id}/session` — Current session state.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] if no session is open.
#[utoipa::path(
    get,
    path = "/api/v1/matches/{id}/session",
    tag = "Sessions",
    summary = "Get session state",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "No session open", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let view = state.officiating.view(&MatchId::from(id)).await?;
    Ok(Json(SessionResponse::from(&view)))
}

/// `DELETE /matches/{id}/session` — Close a session.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] if no session is open.
#[utoipa::path(
    delete,
    path = "/api/v1/matches/{id}/session",
    tag = "Sessions",
    summary = "Close a session",
    description = "Drops the session and cancels its clock and celebration timers. Nothing is written to the backend.",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "No session open", body = ErrorResponse),
    )
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    state.officiating.close_session(&MatchId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /matches/{id}/session/commands` — Apply a lifecycle command.
///
/// # Errors
///
/// Returns 409 when the command is not valid in the current phase.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/session/commands",
    tag = "Sessions",
    summary = "Apply a command",
    description = "Clock, phase and shootout commands: start_match, pause, resume, end_first_half, start_second_half, end_second_half, start_penalties, record_penalty, finish_penalties, finish_match, confirm_result.",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    request_body = SessionCommand,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Malformed command", body = ErrorResponse),
        (status = 404, description = "No session open", body = ErrorResponse),
        (status = 409, description = "Command rejected in this phase", body = ErrorResponse),
    )
)]
pub async fn apply_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(command): Json<SessionCommand>,
) -> Result<impl IntoResponse, GatewayError> {
    let action = command.into_action()?;
    let view = state
        .officiating
        .command(&MatchId::from(id), action)
        .await?;
    Ok(Json(SessionResponse::from(&view)))
}

/// `POST /matches/{id}/session/events` — Record a goal, own goal or card.
///
/// # Errors
///
/// Returns 400 for a missing player, 409 outside a half or while another
/// submission is in flight.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/session/events",
    tag = "Sessions",
    summary = "Record a match event",
    description = "Applies the event optimistically, creates it on the backend and reloads the authoritative record. Backend failures are reported through the event stream and leave the optimistic state in place.",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    request_body = SubmitEventRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "No session open", body = ErrorResponse),
        (status = 409, description = "Event rejected", body = ErrorResponse),
    )
)]
pub async fn submit_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let draft = request.into_draft()?;
    let view = state
        .officiating
        .submit_event(&MatchId::from(id), draft)
        .await?;
    Ok(Json(SessionResponse::from(&view)))
}

/// `POST /matches/{id}/session/rollback` — Undo the last action.
///
/// # Errors
///
/// Returns 409 once the result has been computed.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/session/rollback",
    tag = "Sessions",
    summary = "Roll back",
    description = "Restores the state before the last undoable action and deletes the last backend event when the rollback removed one.",
    params(
        ("id" = String, Path, description = "Match id"),
    ),
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 404, description = "No session open", body = ErrorResponse),
        (status = 409, description = "Rollback unavailable", body = ErrorResponse),
    )
)]
pub async fn rollback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let view = state.officiating.rollback(&MatchId::from(id)).await?;
    Ok(Json(SessionResponse::from(&view)))
}

/// Officiating session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route(
            "/matches/{id}/session",
            post(open_session).get(get_session).delete(close_session),
        )
        .route("/matches/{id}/session/commands", post(apply_command))
        .route("/matches/{id}/session/events", post(submit_event))
        .route("/matches/{id}/session/rollback", post(rollback))
}
