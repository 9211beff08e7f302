//! Tournament handlers: bracket view.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{BracketQuery, BracketResponse};
use crate::app_state::AppState;
use crate::domain::TournamentId;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::BracketScope;

fn parse_scope(value: Option<&str>) -> Result<Option<BracketScope>, GatewayError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("all") => Ok(Some(BracketScope::All)),
        Some("knockout" | "knockout_only") => Ok(Some(BracketScope::KnockoutOnly)),
        Some(other) => Err(GatewayError::InvalidRequest(format!(
            "scope must be \"all\" or \"knockout\", got {other:?}"
        ))),
    }
}

/// `GET /tournaments/{id}/bracket` — Bracket view of a tournament.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an unknown scope, or a
/// backend error if the tournament cannot be loaded.
#[utoipa::path(
    get,
    path = "/api/v1/tournaments/{id}/bracket",
    tag = "Tournaments",
    summary = "Get tournament bracket",
    description = "Groups the tournament's matches into rounds and ties, resolves two-legged aggregates and penalty tie-breaks, and names the champion once the final is decided.",
    params(
        ("id" = String, Path, description = "Tournament id"),
        BracketQuery,
    ),
    responses(
        (status = 200, description = "Bracket", body = BracketResponse),
        (status = 400, description = "Invalid scope", body = ErrorResponse),
        (status = 404, description = "Tournament not found", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<BracketQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let scope = parse_scope(query.scope.as_deref())?;
    let built = state
        .tournaments
        .bracket(&TournamentId::from(id), scope)
        .await?;
    Ok(Json(BracketResponse::from(&built)))
}

/// Tournament routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/tournaments/{id}/bracket", get(get_bracket))
}
