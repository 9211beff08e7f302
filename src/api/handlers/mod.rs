//! REST endpoint handlers organized by resource.

pub mod session;
pub mod system;
pub mod tournament;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(tournament::routes())
        .merge(session::routes())
}
