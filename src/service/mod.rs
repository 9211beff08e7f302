//! Service layer: bracket building and match officiating.
//!
//! [`bracket_builder`] and [`match_controller`] are pure; the
//! [`OfficiatingService`] drives controllers against the backend and
//! emits events through the [`super::domain::EventBus`], and the
//! [`TournamentService`] serves brackets.

pub mod bracket_builder;
pub mod gating;
pub mod match_controller;
pub mod officiating_service;
pub mod tournament_service;

pub use bracket_builder::{BracketScope, build_bracket};
pub use match_controller::{Action, Effect, EventDraft};
pub use officiating_service::{OfficiatingService, OfficiatingSettings};
pub use tournament_service::{TournamentBracket, TournamentService};
