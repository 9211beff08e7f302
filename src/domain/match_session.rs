//! Officiating session: a live match state plus its runtime handles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::MatchId;
use super::live_state::{LiveMatchState, MatchPhase, UndoStack};

/// One officiating session.
///
/// Owns the local [`LiveMatchState`] and its undo stack exclusively.
/// The clock ticker task is aborted when the session is dropped.
#[derive(Debug)]
pub struct MatchSession {
    /// Officiated match (immutable after creation).
    pub match_id: MatchId,

    /// Current local state.
    pub state: LiveMatchState,

    /// Snapshots taken before every undoable action.
    pub undo: UndoStack,

    /// An event submission is awaiting the backend.
    pub submit_in_flight: bool,

    /// Background task driving the clock.
    pub ticker: Option<JoinHandle<()>>,

    /// Creation timestamp.
    pub opened_at: DateTime<Utc>,

    /// Timestamp of the last state mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl MatchSession {
    /// Creates a session around an initial state.
    #[must_use]
    pub fn new(state: LiveMatchState) -> Self {
        let now = Utc::now();
        Self {
            match_id: state.record.id.clone(),
            state,
            undo: UndoStack::new(),
            submit_in_flight: false,
            ticker: None,
            opened_at: now,
            last_modified_at: now,
        }
    }

    /// Stops the clock ticker, if running.
    pub fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for MatchSession {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Full read-out of a session, detached from its lock.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Match identifier.
    pub match_id: MatchId,
    /// Local state at the time of the read.
    pub state: LiveMatchState,
    /// Number of undoable steps.
    pub undo_depth: usize,
    /// An event submission is awaiting the backend.
    pub submit_in_flight: bool,
    /// Session creation timestamp.
    pub opened_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl From<&MatchSession> for SessionView {
    fn from(session: &MatchSession) -> Self {
        Self {
            match_id: session.match_id.clone(),
            state: session.state.clone(),
            undo_depth: session.undo.len(),
            submit_in_flight: session.submit_in_flight,
            opened_at: session.opened_at,
            last_modified_at: session.last_modified_at,
        }
    }
}

/// Lightweight summary of a session for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Match identifier.
    pub match_id: MatchId,
    /// Round of the match.
    pub round: u32,
    /// Current phase.
    pub phase: MatchPhase,
    /// Home goals.
    pub home_score: u32,
    /// Away goals.
    pub away_score: u32,
    /// Session creation timestamp.
    pub opened_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl From<&MatchSession> for SessionSummary {
    fn from(session: &MatchSession) -> Self {
        let score = session.state.score();
        Self {
            match_id: session.match_id.clone(),
            round: session.state.record.round,
            phase: session.state.phase,
            home_score: score.home,
            away_score: score.away,
            opened_at: session.opened_at,
            last_modified_at: session.last_modified_at,
        }
    }
}
