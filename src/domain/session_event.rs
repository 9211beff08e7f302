//! Events reflecting officiating session changes.
//!
//! Every change to a live session emits a [`SessionEvent`] through the
//! [`super::EventBus`]. Events are forwarded to WebSocket subscribers of
//! the match.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::MatchId;
use super::live_state::MatchPhase;
use super::match_event::EventKind;
use super::match_record::Side;

/// Backend operation that failed during background synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    /// Status / score patch.
    UpdateStatus,
    /// Event creation.
    CreateEvent,
    /// Removal of the last event on rollback.
    DeleteLastEvent,
    /// Authoritative reload.
    Reload,
}

/// Domain event emitted after every session mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was opened for a match.
    SessionOpened {
        /// Match identifier.
        match_id: MatchId,
        /// Phase the session starts in.
        phase: MatchPhase,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The session was closed and its timers cancelled.
    SessionClosed {
        /// Match identifier.
        match_id: MatchId,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The lifecycle phase changed.
    PhaseChanged {
        /// Match identifier.
        match_id: MatchId,
        /// Previous phase.
        from: MatchPhase,
        /// New phase.
        to: MatchPhase,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A running clock advanced.
    ClockTicked {
        /// Match identifier.
        match_id: MatchId,
        /// Elapsed match seconds.
        elapsed_secs: u64,
        /// `mm:ss` rendering.
        display: String,
    },

    /// The regulation score changed.
    ScoreChanged {
        /// Match identifier.
        match_id: MatchId,
        /// Home goals.
        home: u32,
        /// Away goals.
        away: u32,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A match event was recorded.
    EventRecorded {
        /// Match identifier.
        match_id: MatchId,
        /// Event kind.
        kind: EventKind,
        /// Side of the player.
        team: Side,
        /// Player name.
        player: String,
        /// Match minute.
        minute: u32,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A shootout kick was recorded.
    PenaltyKickRecorded {
        /// Match identifier.
        match_id: MatchId,
        /// Kicking side.
        team: Side,
        /// Whether it was converted.
        scored: bool,
        /// Home tally after the kick.
        home: u32,
        /// Away tally after the kick.
        away: u32,
    },

    /// Goal overlay shown.
    GoalCelebrationStarted {
        /// Match identifier.
        match_id: MatchId,
        /// Side credited with the goal.
        team: Side,
        /// Scorer.
        player: String,
    },

    /// Goal overlay expired.
    GoalCelebrationEnded {
        /// Match identifier.
        match_id: MatchId,
    },

    /// The last action was undone.
    RolledBack {
        /// Match identifier.
        match_id: MatchId,
        /// Phase after the rollback.
        phase: MatchPhase,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A background backend call failed; local state was kept.
    SyncFailed {
        /// Match identifier.
        match_id: MatchId,
        /// Failed operation.
        operation: SyncOperation,
        /// Error message.
        message: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns the match this event belongs to.
    #[must_use]
    pub fn match_id(&self) -> &MatchId {
        match self {
            Self::SessionOpened { match_id, .. }
            | Self::SessionClosed { match_id, .. }
            | Self::PhaseChanged { match_id, .. }
            | Self::ClockTicked { match_id, .. }
            | Self::ScoreChanged { match_id, .. }
            | Self::EventRecorded { match_id, .. }
            | Self::PenaltyKickRecorded { match_id, .. }
            | Self::GoalCelebrationStarted { match_id, .. }
            | Self::GoalCelebrationEnded { match_id }
            | Self::RolledBack { match_id, .. }
            | Self::SyncFailed { match_id, .. } => match_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SessionOpened { .. } => "session_opened",
            Self::SessionClosed { .. } => "session_closed",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::ClockTicked { .. } => "clock_ticked",
            Self::ScoreChanged { .. } => "score_changed",
            Self::EventRecorded { .. } => "event_recorded",
            Self::PenaltyKickRecorded { .. } => "penalty_kick_recorded",
            Self::GoalCelebrationStarted { .. } => "goal_celebration_started",
            Self::GoalCelebrationEnded { .. } => "goal_celebration_ended",
            Self::RolledBack { .. } => "rolled_back",
            Self::SyncFailed { .. } => "sync_failed",
        }
    }
}
