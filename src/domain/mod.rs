//! Domain layer: match records, bracket structure, live match state, and
//! the session/event infrastructure.
//!
//! This module contains the server-side domain model: identifiers, the
//! backend's match record shape with its defensive metadata parsing, the
//! derived bracket types, the officiating state machine's state, the event
//! bus for broadcasting session changes, and the session registry.

pub mod bracket;
pub mod event_bus;
pub mod ids;
pub mod live_state;
pub mod match_event;
pub mod match_record;
pub mod match_session;
pub mod session_event;
pub mod session_registry;

pub use bracket::{Bracket, BracketCell, BracketRound, LegScore, ScorePair};
pub use event_bus::{EventBus, MatchFeed};
pub use ids::{EventId, MatchId, ParticipantId, TournamentId};
pub use live_state::{
    LiveMatchState, MatchClock, MatchPhase, PenaltyKick, PenaltyShootout, UndoStack,
};
pub use match_event::{EventKind, MatchEvent};
pub use match_record::{
    MatchDetails, MatchRecord, MatchStatus, Participant, Side, Stage, Tournament,
    TournamentFormat,
};
pub use match_session::{MatchSession, SessionSummary, SessionView};
pub use session_event::{SessionEvent, SyncOperation};
pub use session_registry::SessionRegistry;
