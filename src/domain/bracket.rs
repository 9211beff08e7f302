//! Derived bracket structure: rounds of ties with resolved winners.
//!
//! Nothing here is persisted. A [`Bracket`] is rebuilt from the flat match
//! list every time it is requested.

use serde::Serialize;

use super::MatchId;
use super::match_record::{Participant, Side};

/// A `{home, away}` pair of goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScorePair {
    /// Home goals.
    pub home: u32,
    /// Away goals.
    pub away: u32,
}

impl ScorePair {
    /// Creates a pair.
    #[must_use]
    pub const fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Returns the leading side, or `None` when level.
    #[must_use]
    pub const fn leader(&self) -> Option<Side> {
        if self.home > self.away {
            Some(Side::Home)
        } else if self.away > self.home {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Goals of one side.
    #[must_use]
    pub const fn get(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

/// Score of one leg, oriented to the owning cell's home/away sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegScore {
    /// Record this leg comes from.
    pub match_id: MatchId,
    /// Leg number (1 for single-leg ties).
    pub leg: u8,
    /// Cell-home goals; `None` until played.
    pub home: Option<u32>,
    /// Cell-away goals; `None` until played.
    pub away: Option<u32>,
}

impl LegScore {
    /// Returns the pair once both scores are reported.
    #[must_use]
    pub fn reported(&self) -> Option<ScorePair> {
        Some(ScorePair::new(self.home?, self.away?))
    }
}

/// One tie, possibly spanning two legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketCell {
    /// Home identity; `None` renders as TBD.
    pub home: Option<Participant>,
    /// Away identity; `None` renders as TBD.
    pub away: Option<Participant>,
    /// Per-leg scores ordered by leg.
    pub scores: Vec<LegScore>,
    /// Home side won the tie.
    pub home_win: bool,
    /// Away side won the tie.
    pub away_win: bool,
    /// More than one leg belongs to this tie.
    pub is_double_leg: bool,
    /// Shootout score, oriented to the cell's sides.
    pub penalty: Option<ScorePair>,
    /// Third-place playoff cell.
    pub is_third_place: bool,
    /// Ordering key within the round.
    pub match_index: u32,
}

impl BracketCell {
    /// Returns the winning side, if decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        if self.home_win {
            Some(Side::Home)
        } else if self.away_win {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Returns `true` once the tie has a winner.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.home_win || self.away_win
    }

    /// Identity of one side.
    #[must_use]
    pub const fn participant(&self, side: Side) -> Option<&Participant> {
        match side {
            Side::Home => self.home.as_ref(),
            Side::Away => self.away.as_ref(),
        }
    }

    /// Identity of the winner, if decided and assigned.
    #[must_use]
    pub fn winner_participant(&self) -> Option<&Participant> {
        self.winner().and_then(|side| self.participant(side))
    }
}

/// Ties sharing a round number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketRound {
    /// Round number from the match records.
    pub round: u32,
    /// Display name (`Final`, `Semi Final`, `Round n`, override, ...).
    pub name: String,
    /// Cells ordered by `match_index`.
    pub cells: Vec<BracketCell>,
}

impl BracketRound {
    /// The title cell of a round: its first non-third-place cell.
    #[must_use]
    pub fn main_cell(&self) -> Option<&BracketCell> {
        self.cells.iter().find(|c| !c.is_third_place)
    }

    /// The third-place playoff cell, if present.
    #[must_use]
    pub fn third_place_cell(&self) -> Option<&BracketCell> {
        self.cells.iter().find(|c| c.is_third_place)
    }
}

/// Full bracket with the resolved champion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Bracket {
    /// Rounds in ascending round order.
    pub rounds: Vec<BracketRound>,
    /// Champion identity; `None` while TBD.
    pub champion: Option<Participant>,
}

impl Bracket {
    /// The last round, normally the final.
    #[must_use]
    pub fn final_round(&self) -> Option<&BracketRound> {
        self.rounds.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_of_pair() {
        assert_eq!(ScorePair::new(2, 1).leader(), Some(Side::Home));
        assert_eq!(ScorePair::new(0, 3).leader(), Some(Side::Away));
        assert_eq!(ScorePair::new(1, 1).leader(), None);
    }

    #[test]
    fn leg_score_reports_only_when_complete() {
        let mut leg = LegScore {
            match_id: MatchId::from("1"),
            leg: 1,
            home: Some(2),
            away: None,
        };
        assert_eq!(leg.reported(), None);
        leg.away = Some(0);
        assert_eq!(leg.reported(), Some(ScorePair::new(2, 0)));
    }
}
