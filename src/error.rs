//! Gateway error types with HTTP status code mapping.
//!
//! [`MatchError`] is raised by the match lifecycle controller and the
//! officiating gates. [`GatewayError`] is the central error type for the
//! gateway; each variant maps to a specific HTTP status code and
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::backend::BackendError;
use crate::domain::{MatchId, MatchPhase};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "round 4 is not completed yet",
///     "details": "4"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Rejections raised by the officiating state machine and its gates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// One or both participants are still TBD.
    #[error("participants are not assigned yet")]
    ParticipantsNotReady,

    /// A match of the preceding round is not completed.
    #[error("round {round} is not completed yet")]
    PreviousRoundIncomplete {
        /// Blocking round number.
        round: u32,
    },

    /// The first leg of this tie is missing or not completed.
    #[error("first leg is not completed yet")]
    FirstLegIncomplete {
        /// First leg to officiate instead, when it exists.
        first_leg: Option<MatchId>,
    },

    /// The action is not valid in the current phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        /// Current phase.
        phase: MatchPhase,
        /// Attempted action.
        action: &'static str,
    },

    /// An event was submitted without a player name.
    #[error("player name is required")]
    MissingPlayer,

    /// The score is level and the result must be decided by penalties.
    #[error("scores are level: a penalty shootout is required")]
    PenaltiesRequired,

    /// No shootout has been started.
    #[error("penalty shootout has not started")]
    ShootoutNotActive,

    /// The shootout was already marked finished.
    #[error("penalty shootout is already finished")]
    ShootoutAlreadyFinished,

    /// The shootout cannot be finished yet, or finished without a winner.
    #[error("penalty shootout is not decided")]
    ShootoutUndecided,

    /// Results that were computed or confirmed cannot be undone.
    #[error("rollback is not available once the result is computed")]
    RollbackUnavailable,

    /// The match is completed; no further mutation is permitted.
    #[error("match is completed")]
    MatchCompleted,
}

impl MatchError {
    /// Returns `true` for prerequisite violations that block the whole
    /// session rather than a single action.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::ParticipantsNotReady
                | Self::PreviousRoundIncomplete { .. }
                | Self::FirstLegIncomplete { .. }
        )
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                   |
/// |-----------|-----------------------|-------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request               |
/// | 2000–2999 | State / prerequisites | 404 / 409 / 423               |
/// | 3000–3999 | Server / backend      | 500 / 502                     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No officiating session is open for the match.
    #[error("no session open for match {0}")]
    SessionNotFound(MatchId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected by the match lifecycle controller.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Another event submission for the match is still in flight.
    #[error("an event submission is already in flight for match {0}")]
    SubmitInFlight(MatchId),

    /// Tournament backend failure.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Match(MatchError::MissingPlayer) => 1002,
            Self::SessionNotFound(_) => 2001,
            Self::Match(MatchError::ParticipantsNotReady) => 2002,
            Self::Match(MatchError::PreviousRoundIncomplete { .. }) => 2003,
            Self::Match(MatchError::FirstLegIncomplete { .. }) => 2004,
            Self::Match(MatchError::InvalidTransition { .. }) => 2005,
            Self::Match(MatchError::PenaltiesRequired) => 2006,
            Self::Match(
                MatchError::ShootoutNotActive
                | MatchError::ShootoutAlreadyFinished
                | MatchError::ShootoutUndecided,
            ) => 2007,
            Self::Match(MatchError::RollbackUnavailable) => 2008,
            Self::Match(MatchError::MatchCompleted) => 2009,
            Self::SubmitInFlight(_) => 2010,
            Self::Backend(BackendError::NotFound(_)) => 2011,
            Self::Backend(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Match(MatchError::MissingPlayer) => {
                StatusCode::BAD_REQUEST
            }
            Self::SessionNotFound(_) | Self::Backend(BackendError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Match(
                MatchError::ParticipantsNotReady
                | MatchError::PreviousRoundIncomplete { .. }
                | MatchError::FirstLegIncomplete { .. },
            ) => StatusCode::LOCKED,
            Self::Match(_) | Self::SubmitInFlight(_) => StatusCode::CONFLICT,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable detail for blocking errors: the blocking round or
    /// the first leg to officiate instead.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Match(MatchError::PreviousRoundIncomplete { round }) => Some(round.to_string()),
            Self::Match(MatchError::FirstLegIncomplete { first_leg }) => {
                first_leg.as_ref().map(ToString::to_string)
            }
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
