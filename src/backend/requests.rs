//! Request bodies sent to the backend.

use serde::Serialize;

use crate::domain::{EventKind, LiveMatchState, MatchPhase, MatchStatus, Side};

/// Body of `PATCH /api/matches/{matchId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPatch {
    /// Server status.
    pub status: MatchStatus,
    /// Server period for live matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Home goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    /// Away goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    /// Home shootout goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_penalty_score: Option<u32>,
    /// Away shootout goals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_penalty_score: Option<u32>,
}

impl MatchPatch {
    /// Status-only patch announcing a phase change.
    #[must_use]
    pub fn phase(phase: MatchPhase) -> Self {
        let (status, period) = phase.server_status();
        Self {
            status,
            period: period.map(str::to_string),
            home_score: None,
            away_score: None,
            home_penalty_score: None,
            away_penalty_score: None,
        }
    }

    /// Completion patch carrying the final regulation score and, when a
    /// shootout was played, its tally.
    #[must_use]
    pub fn completion(state: &LiveMatchState) -> Self {
        let score = state.score();
        let penalties = state.shootout.active.then(|| state.shootout.tally());
        Self {
            status: MatchStatus::Completed,
            period: None,
            home_score: Some(score.home),
            away_score: Some(score.away),
            home_penalty_score: penalties.map(|p| p.home),
            away_penalty_score: penalties.map(|p| p.away),
        }
    }
}

/// Body of `POST /api/matches/{matchId}/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMatchEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Side of the player.
    pub team: Side,
    /// Player name.
    pub player: String,
    /// Match minute.
    pub time: u32,
    /// Free-form detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
