//! Match events: goals, own goals and cards.

use serde::{Deserialize, Serialize};

use super::EventId;
use super::match_record::Side;

/// Kind of a recorded match event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Regular goal, credited to the player's side.
    Goal,
    /// Own goal, credited to the opposite side of the player.
    OwnGoal,
    /// Disciplinary card. Does not affect the score.
    Card,
}

impl EventKind {
    /// Returns the side whose tally increases when a player of `team`
    /// produces this event, or `None` for non-scoring events.
    #[must_use]
    pub const fn scoring_side(self, team: Side) -> Option<Side> {
        match self {
            Self::Goal => Some(team),
            Self::OwnGoal => Some(team.opposite()),
            Self::Card => None,
        }
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::OwnGoal => "own_goal",
            Self::Card => "card",
        }
    }
}

/// One entry of a match's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Backend id, or a temporary id for optimistic entries.
    pub id: EventId,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Side of the player involved.
    pub team: Side,
    /// Player display name.
    pub player: String,
    /// Match minute.
    #[serde(alias = "time")]
    pub minute: u32,
    /// Free-form detail (card colour, assist, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Inserts `event` keeping the log ordered by minute.
///
/// Events sharing a minute keep their insertion order.
pub fn insert_by_minute(events: &mut Vec<MatchEvent>, event: MatchEvent) {
    let position = events.partition_point(|e| e.minute <= event.minute);
    events.insert(position, event);
}

/// Stable-sorts an event log by minute.
pub fn sort_by_minute(events: &mut [MatchEvent]) {
    events.sort_by_key(|e| e.minute);
}
