//! Bracket DTOs for `GET /tournaments/{id}/bracket`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{ParticipantDto, ScoreDto};
use crate::domain::{BracketCell, BracketRound, LegScore, TournamentFormat};
use crate::service::bracket_builder::UNINDEXED;
use crate::service::{BracketScope, TournamentBracket};

/// Query parameters of the bracket endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BracketQuery {
    /// `all` or `knockout`. Defaults to `knockout` for group+knockout
    /// tournaments and `all` otherwise.
    #[serde(default)]
    pub scope: Option<String>,
}

/// One leg's score, oriented to the cell's home/away.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LegScoreDto {
    /// Backend id of the leg's match.
    pub match_id: String,
    /// Leg number.
    pub leg: u8,
    /// Goals of the cell's home side.
    pub home: Option<u32>,
    /// Goals of the cell's away side.
    pub away: Option<u32>,
}

impl From<&LegScore> for LegScoreDto {
    fn from(leg: &LegScore) -> Self {
        Self {
            match_id: leg.match_id.to_string(),
            leg: leg.leg,
            home: leg.home,
            away: leg.away,
        }
    }
}

/// One tie.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketCellDto {
    /// Home side; absent while TBD.
    pub home: Option<ParticipantDto>,
    /// Away side; absent while TBD.
    pub away: Option<ParticipantDto>,
    /// Legs ordered by leg number.
    pub scores: Vec<LegScoreDto>,
    /// Home side won the tie.
    pub home_win: bool,
    /// Away side won the tie.
    pub away_win: bool,
    /// Tie is played over two legs.
    pub is_double_leg: bool,
    /// Shootout tally, when one was played.
    pub penalty: Option<ScoreDto>,
    /// Third-place play-off.
    pub is_third_place: bool,
    /// Position in the round; absent when unindexed.
    pub match_index: Option<u32>,
}

impl From<&BracketCell> for BracketCellDto {
    fn from(cell: &BracketCell) -> Self {
        Self {
            home: cell.home.as_ref().map(ParticipantDto::from),
            away: cell.away.as_ref().map(ParticipantDto::from),
            scores: cell.scores.iter().map(LegScoreDto::from).collect(),
            home_win: cell.home_win,
            away_win: cell.away_win,
            is_double_leg: cell.is_double_leg,
            penalty: cell.penalty.map(ScoreDto::from),
            is_third_place: cell.is_third_place,
            match_index: (cell.match_index != UNINDEXED).then_some(cell.match_index),
        }
    }
}

/// One round column.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketRoundDto {
    /// Round number.
    pub round: u32,
    /// Display name.
    pub name: String,
    /// Ties in display order.
    pub cells: Vec<BracketCellDto>,
}

impl From<&BracketRound> for BracketRoundDto {
    fn from(round: &BracketRound) -> Self {
        Self {
            round: round.round,
            name: round.name.clone(),
            cells: round.cells.iter().map(BracketCellDto::from).collect(),
        }
    }
}

/// Response body of the bracket endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketResponse {
    /// Tournament id.
    pub tournament_id: String,
    /// Tournament name.
    pub name: String,
    /// `league`, `knockout` or `group_knockout`.
    pub format: String,
    /// Scope the bracket was built with.
    pub scope: String,
    /// Rounds in ascending order.
    pub rounds: Vec<BracketRoundDto>,
    /// Winner of the final; absent while undecided.
    pub champion: Option<ParticipantDto>,
}

/// Wire name of a scope.
#[must_use]
pub const fn scope_name(scope: BracketScope) -> &'static str {
    match scope {
        BracketScope::All => "all",
        BracketScope::KnockoutOnly => "knockout",
    }
}

const fn format_name(format: TournamentFormat) -> &'static str {
    match format {
        TournamentFormat::League => "league",
        TournamentFormat::Knockout => "knockout",
        TournamentFormat::GroupKnockout => "group_knockout",
    }
}

impl From<&TournamentBracket> for BracketResponse {
    fn from(built: &TournamentBracket) -> Self {
        Self {
            tournament_id: built.tournament.id.to_string(),
            name: built.tournament.name.clone(),
            format: format_name(built.tournament.format).to_string(),
            scope: scope_name(built.scope).to_string(),
            rounds: built.bracket.rounds.iter().map(BracketRoundDto::from).collect(),
            champion: built.bracket.champion.as_ref().map(ParticipantDto::from),
        }
    }
}
