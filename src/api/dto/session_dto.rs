//! Officiating session DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{PaginationMeta, ParticipantDto, ScoreDto, parse_side};
use crate::domain::{
    EventKind, MatchEvent, MatchPhase, PenaltyKick, Side, SessionSummary, SessionView,
};
use crate::error::GatewayError;
use crate::service::{Action, EventDraft};

/// Request body for `POST /matches/{id}/session`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    /// Real minutes per half; the server default when absent.
    #[serde(default, alias = "halfDurationMinutes")]
    pub half_duration_minutes: Option<u32>,
}

/// Request body for `POST /matches/{id}/session/commands`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    /// Kick off.
    StartMatch,
    /// Pause the clock.
    Pause,
    /// Resume the clock.
    Resume,
    /// Half-time whistle.
    EndFirstHalf,
    /// Second-half kick-off.
    StartSecondHalf,
    /// End of regulation.
    EndSecondHalf,
    /// Open the shootout.
    StartPenalties,
    /// Record one shootout kick.
    RecordPenalty {
        /// `home` or `away`.
        team: String,
        /// Whether the kick was converted.
        scored: bool,
    },
    /// Mark the shootout finished.
    FinishPenalties,
    /// Compute the result.
    FinishMatch,
    /// Persist the result.
    ConfirmResult,
}

impl SessionCommand {
    /// Converts into a controller action.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unknown side.
    pub fn into_action(self) -> Result<Action, GatewayError> {
        Ok(match self {
            Self::StartMatch => Action::StartMatch,
            Self::Pause => Action::Pause,
            Self::Resume => Action::Resume,
            Self::EndFirstHalf => Action::EndFirstHalf,
            Self::StartSecondHalf => Action::StartSecondHalf,
            Self::EndSecondHalf => Action::EndSecondHalf,
            Self::StartPenalties => Action::StartPenalties,
            Self::RecordPenalty { team, scored } => Action::RecordPenalty {
                team: parse_side(&team)?,
                scored,
            },
            Self::FinishPenalties => Action::FinishPenalties,
            Self::FinishMatch => Action::FinishMatch,
            Self::ConfirmResult => Action::ConfirmResult,
        })
    }
}

/// Request body for `POST /matches/{id}/session/events`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitEventRequest {
    /// `goal`, `own_goal` or `card`.
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    /// Side of the player: `home` or `away`.
    pub team: String,
    /// Player name.
    #[serde(default)]
    pub player: String,
    /// Match minute; the running clock's minute when absent.
    #[serde(default, alias = "time")]
    pub minute: Option<u32>,
    /// Free-form detail.
    #[serde(default)]
    pub detail: Option<String>,
}

fn parse_kind(value: &str) -> Result<EventKind, GatewayError> {
    match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
        "goal" => Ok(EventKind::Goal),
        "own_goal" | "owngoal" => Ok(EventKind::OwnGoal),
        "card" => Ok(EventKind::Card),
        other => Err(GatewayError::InvalidRequest(format!(
            "unknown event type {other:?}"
        ))),
    }
}

impl SubmitEventRequest {
    /// Validates the wire values into an [`EventDraft`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unknown kind or side.
    pub fn into_draft(self) -> Result<EventDraft, GatewayError> {
        Ok(EventDraft {
            kind: parse_kind(&self.kind)?,
            team: parse_side(&self.team)?,
            player: self.player,
            minute: self.minute,
            detail: self.detail.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Match clock read-out.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClockDto {
    /// Elapsed match seconds.
    pub elapsed_secs: u64,
    /// `mm:ss`.
    pub display: String,
    /// Current 1-based minute.
    pub minute: u32,
    /// Clock advances on ticks.
    pub running: bool,
    /// Real minutes per half.
    pub half_duration_minutes: u32,
}

/// One shootout kick.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PenaltyKickDto {
    /// Kicking side.
    pub team: String,
    /// Converted.
    pub scored: bool,
}

impl From<&PenaltyKick> for PenaltyKickDto {
    fn from(kick: &PenaltyKick) -> Self {
        Self {
            team: kick.team.to_string(),
            scored: kick.scored,
        }
    }
}

/// Shootout sub-state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShootoutDto {
    /// Home conversions.
    pub home: u32,
    /// Away conversions.
    pub away: u32,
    /// Kicks in order.
    pub history: Vec<PenaltyKickDto>,
    /// Marked finished.
    pub finished: bool,
    /// Shootout winner once finished.
    pub winner: Option<String>,
}

/// One event of the match log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchEventDto {
    /// Backend id, or a temporary id while unconfirmed.
    pub id: String,
    /// `goal`, `own_goal` or `card`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Side of the player.
    pub team: String,
    /// Player name.
    pub player: String,
    /// Match minute.
    pub minute: u32,
    /// Free-form detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Not yet confirmed by the backend.
    pub pending: bool,
}

impl From<&MatchEvent> for MatchEventDto {
    fn from(event: &MatchEvent) -> Self {
        Self {
            id: event.id.to_string(),
            kind: event.kind.as_str().to_string(),
            team: event.team.to_string(),
            player: event.player.clone(),
            minute: event.minute,
            detail: event.detail.clone(),
            pending: event.id.is_temporary(),
        }
    }
}

/// Full view of an officiating session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Officiated match.
    pub match_id: String,
    /// Round of the match.
    pub round: u32,
    /// Local phase (`scheduled`, `1st_half`, ..., `completed`).
    pub phase: String,
    /// Home side.
    pub home: Option<ParticipantDto>,
    /// Away side.
    pub away: Option<ParticipantDto>,
    /// Regulation score.
    pub score: ScoreDto,
    /// Aggregate including the first leg, for return legs.
    pub aggregate: Option<ScoreDto>,
    /// Match clock.
    pub clock: ClockDto,
    /// Shootout, once started.
    pub shootout: Option<ShootoutDto>,
    /// Winner computed when finishing.
    pub winner: Option<String>,
    /// A level score must be broken by penalties.
    pub decisive: bool,
    /// Event log ordered by minute.
    pub events: Vec<MatchEventDto>,
    /// Undoable steps.
    pub undo_depth: usize,
    /// Rollback would do something.
    pub can_rollback: bool,
    /// An event submission is pending.
    pub submit_in_flight: bool,
    /// Session creation time.
    pub opened_at: DateTime<Utc>,
    /// Last mutation time.
    pub last_modified_at: DateTime<Utc>,
}

fn side_name(side: Option<Side>) -> Option<String> {
    side.map(|s| s.to_string())
}

impl From<&SessionView> for SessionResponse {
    fn from(view: &SessionView) -> Self {
        let state = &view.state;
        let rollback_open = !matches!(state.phase, MatchPhase::Finished | MatchPhase::Completed);
        Self {
            match_id: view.match_id.to_string(),
            round: state.record.round,
            phase: state.phase.as_str().to_string(),
            home: state.record.participant(Side::Home).as_ref().map(ParticipantDto::from),
            away: state.record.participant(Side::Away).as_ref().map(ParticipantDto::from),
            score: state.score().into(),
            aggregate: state.first_leg.as_ref().map(|_| state.aggregate().into()),
            clock: ClockDto {
                elapsed_secs: state.clock.elapsed_secs(),
                display: state.clock.display(),
                minute: state.clock.minute(),
                running: state.clock.is_running(),
                half_duration_minutes: state.clock.half_duration_minutes(),
            },
            shootout: state.shootout.active.then(|| ShootoutDto {
                home: state.shootout.home,
                away: state.shootout.away,
                history: state.shootout.history.iter().map(PenaltyKickDto::from).collect(),
                finished: state.shootout.finished,
                winner: side_name(state.shootout.winner),
            }),
            winner: side_name(state.winner),
            decisive: state.decisive,
            events: state.record.events.iter().map(MatchEventDto::from).collect(),
            undo_depth: view.undo_depth,
            can_rollback: rollback_open
                && (view.undo_depth > 0 || state.phase == MatchPhase::FulltimePending),
            submit_in_flight: view.submit_in_flight,
            opened_at: view.opened_at,
            last_modified_at: view.last_modified_at,
        }
    }
}

/// Session row of `GET /sessions`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummaryDto {
    /// Officiated match.
    pub match_id: String,
    /// Round of the match.
    pub round: u32,
    /// Local phase.
    pub phase: String,
    /// Home goals.
    pub home_score: u32,
    /// Away goals.
    pub away_score: u32,
    /// Session creation time.
    pub opened_at: DateTime<Utc>,
    /// Last mutation time.
    pub last_modified_at: DateTime<Utc>,
}

impl From<SessionSummary> for SessionSummaryDto {
    fn from(s: SessionSummary) -> Self {
        Self {
            match_id: s.match_id.to_string(),
            round: s.round,
            phase: s.phase.as_str().to_string(),
            home_score: s.home_score,
            away_score: s.away_score,
            opened_at: s.opened_at,
            last_modified_at: s.last_modified_at,
        }
    }
}

/// Paginated list response for `GET /sessions`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Sessions on this page.
    pub data: Vec<SessionSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
