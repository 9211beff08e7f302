//! Bracket builder: flat match list to rounds of ties.
//!
//! [`build_bracket`] is a pure function of its input. It groups records by
//! round and, within a round, by `groupId` so that the legs of a tie land
//! in one [`BracketCell`]. Legs are oriented to the cell's sides by
//! participant identity, because the return leg swaps home and away.

use std::collections::BTreeMap;

use crate::domain::{
    Bracket, BracketCell, BracketRound, LegScore, MatchRecord, Participant, ScorePair, Side,
    Stage, TournamentFormat,
};

/// Ordering key of cells without a `matchIndex`; sorts them last.
pub const UNINDEXED: u32 = u32::MAX;

/// Which records take part in the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketScope {
    /// Every record.
    All,
    /// Only records whose `details.stage` is `knockout`.
    KnockoutOnly,
}

impl BracketScope {
    /// Default scope for a tournament format: hybrid formats only draw
    /// their knockout stage.
    #[must_use]
    pub const fn for_format(format: TournamentFormat) -> Self {
        match format {
            TournamentFormat::GroupKnockout => Self::KnockoutOnly,
            TournamentFormat::League | TournamentFormat::Knockout => Self::All,
        }
    }

    fn includes(self, record: &MatchRecord) -> bool {
        match self {
            Self::All => true,
            Self::KnockoutOnly => record.details.stage == Some(Stage::Knockout),
        }
    }
}

/// Builds the bracket and resolves the champion.
#[must_use]
pub fn build_bracket(records: &[MatchRecord], scope: BracketScope) -> Bracket {
    let mut by_round: BTreeMap<u32, Vec<&MatchRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| scope.includes(r)) {
        by_round.entry(record.round).or_default().push(record);
    }
    let Some(max_round) = by_round.keys().next_back().copied() else {
        return Bracket::default();
    };

    let rounds: Vec<BracketRound> = by_round
        .into_iter()
        .map(|(round, records)| build_round(round, records, max_round))
        .collect();
    let champion = rounds
        .last()
        .and_then(BracketRound::main_cell)
        .and_then(BracketCell::winner_participant)
        .cloned();

    Bracket { rounds, champion }
}

fn build_round(round: u32, mut records: Vec<&MatchRecord>, max_round: u32) -> BracketRound {
    records.sort_by(|a, b| {
        (a.details.leg.unwrap_or(1), &a.id).cmp(&(b.details.leg.unwrap_or(1), &b.id))
    });

    let mut ties: Vec<(String, Vec<&MatchRecord>)> = Vec::new();
    for record in &records {
        let key = match &record.details.group_id {
            Some(group) => format!("group:{group}"),
            None => format!("match:{}", record.id),
        };
        match ties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, legs)) => legs.push(record),
            None => ties.push((key, vec![record])),
        }
    }

    let mut cells: Vec<(BracketCell, &MatchRecord)> = ties
        .into_iter()
        .filter_map(|(_, legs)| legs.first().copied().map(|first| (build_cell(&legs), first)))
        .collect();
    cells.sort_by(|(a, first_a), (b, first_b)| {
        (a.match_index, &first_a.id).cmp(&(b.match_index, &first_b.id))
    });
    let cells: Vec<BracketCell> = cells.into_iter().map(|(cell, _)| cell).collect();

    let name = round_name(round, max_round, &records, &cells);
    BracketRound { round, name, cells }
}

fn round_name(
    round: u32,
    max_round: u32,
    records: &[&MatchRecord],
    cells: &[BracketCell],
) -> String {
    if let Some(name) = records.iter().find_map(|r| r.details.round_name.clone()) {
        return name;
    }
    if round == max_round {
        if cells.iter().any(|c| c.is_third_place) {
            "Finals".to_string()
        } else {
            "Final".to_string()
        }
    } else if round.checked_add(1) == Some(max_round) {
        "Semi Final".to_string()
    } else {
        format!("Round {round}")
    }
}

/// Whether `record` lists the cell's sides the other way round.
fn is_swapped(
    record: &MatchRecord,
    home: Option<&Participant>,
    away: Option<&Participant>,
) -> bool {
    let faces = |side: Side, who: Option<&Participant>| {
        who.zip(record.participant(side))
            .is_some_and(|(who, other)| who.same_as(&other))
    };
    faces(Side::Away, home) || faces(Side::Home, away)
}

fn build_cell(legs: &[&MatchRecord]) -> BracketCell {
    let mut home: Option<Participant> = None;
    let mut away: Option<Participant> = None;
    let mut scores = Vec::with_capacity(legs.len());
    let mut penalty = None;

    for record in legs {
        let (cell_home, cell_away) = if is_swapped(record, home.as_ref(), away.as_ref()) {
            (Side::Away, Side::Home)
        } else {
            (Side::Home, Side::Away)
        };
        if home.is_none() {
            home = record.participant(cell_home);
        }
        if away.is_none() {
            away = record.participant(cell_away);
        }
        scores.push(LegScore {
            match_id: record.id.clone(),
            leg: record.details.leg.unwrap_or(1),
            home: record.score(cell_home),
            away: record.score(cell_away),
        });
        if penalty.is_none() {
            penalty = record
                .penalty_score(cell_home)
                .zip(record.penalty_score(cell_away))
                .map(|(h, a)| ScorePair::new(h, a));
        }
    }
    scores.sort_by_key(|s| s.leg);

    let is_double_leg = legs.len() > 1 || legs.iter().any(|r| r.details.is_two_legged());
    let winner = decide(&scores, is_double_leg, penalty);

    BracketCell {
        home,
        away,
        scores,
        home_win: winner == Some(Side::Home),
        away_win: winner == Some(Side::Away),
        is_double_leg,
        penalty,
        is_third_place: legs.iter().any(|r| r.details.is_third_place),
        match_index: legs
            .iter()
            .filter_map(|r| r.details.match_index)
            .min()
            .unwrap_or(UNINDEXED),
    }
}

/// A tie is decided only when every expected leg is fully reported. Level
/// aggregates fall back to the shootout; a draw is never terminal.
fn decide(scores: &[LegScore], is_double_leg: bool, penalty: Option<ScorePair>) -> Option<Side> {
    let expected = if is_double_leg { 2 } else { 1 };
    let reported: Vec<ScorePair> = scores.iter().filter_map(LegScore::reported).collect();
    if reported.len() < expected || reported.len() != scores.len() {
        return None;
    }
    let aggregate = reported.iter().fold(ScorePair::default(), |acc, leg| {
        ScorePair::new(
            acc.home.saturating_add(leg.home),
            acc.away.saturating_add(leg.away),
        )
    });
    aggregate
        .leader()
        .or_else(|| penalty.and_then(|p| p.leader()))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{MatchDetails, ParticipantId};
    use crate::test_support::{MatchBuilder, team};

    fn round_names(bracket: &Bracket) -> Vec<&str> {
        bracket.rounds.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn empty_input_yields_empty_bracket() {
        let bracket = build_bracket(&[], BracketScope::All);
        assert!(bracket.rounds.is_empty());
        assert!(bracket.champion.is_none());
    }

    #[test]
    fn two_legged_aggregate_follows_identity_not_position() {
        let a = team("A", "Alpha");
        let b = team("B", "Bravo");
        let records = vec![
            MatchBuilder::new("1", 1).teams(&a, &b).leg(1, "g1").score(2, 1).build(),
            MatchBuilder::new("2", 1).teams(&b, &a).leg(2, "g1").score(0, 2).build(),
        ];
        let bracket = build_bracket(&records, BracketScope::All);
        let cell = &bracket.rounds[0].cells[0];

        assert!(cell.is_double_leg);
        assert_eq!(cell.home.as_ref().map(|p| p.name.as_str()), Some("Alpha"));
        assert_eq!(cell.scores.len(), 2);
        assert_eq!((cell.scores[1].home, cell.scores[1].away), (Some(2), Some(0)));
        assert!(cell.home_win);
        assert!(!cell.away_win);
    }

    #[test]
    fn huge_aggregate_saturates_instead_of_overflowing() {
        let a = team("A", "Alpha");
        let b = team("B", "Bravo");
        let records = vec![
            MatchBuilder::new("1", 1).teams(&a, &b).leg(1, "g1").score(u32::MAX, 0).build(),
            MatchBuilder::new("2", 1).teams(&b, &a).leg(2, "g1").score(0, 1).build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert!(cell.home_win);
        assert_eq!(cell.winner(), Some(Side::Home));
    }

    #[test]
    fn single_leg_level_score_breaks_on_penalties() {
        let records = vec![
            MatchBuilder::new("1", 1)
                .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                .score(1, 1)
                .penalties(4, 3)
                .build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert!(!cell.is_double_leg);
        assert_eq!(cell.penalty, Some(ScorePair::new(4, 3)));
        assert_eq!(cell.winner(), Some(Side::Home));
    }

    #[test]
    fn level_without_penalties_stays_undecided() {
        let records = vec![
            MatchBuilder::new("1", 1)
                .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                .score(2, 2)
                .build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert!(!cell.is_decided());
    }

    #[test]
    fn missing_second_leg_leaves_tie_undecided() {
        let records = vec![
            MatchBuilder::new("1", 1)
                .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                .leg(1, "g1")
                .score(1, 1)
                .build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert!(cell.is_double_leg);
        assert!(!cell.is_decided());

        let records = vec![
            MatchBuilder::new("1", 1)
                .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                .leg(1, "g1")
                .score(3, 0)
                .build(),
            MatchBuilder::new("2", 1)
                .teams(&team("B", "Bravo"), &team("A", "Alpha"))
                .leg(2, "g1")
                .build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert!(!cell.is_decided());
    }

    #[test]
    fn penalty_on_return_leg_is_oriented_to_cell() {
        let a = team("A", "Alpha");
        let b = team("B", "Bravo");
        let records = vec![
            MatchBuilder::new("1", 1).teams(&a, &b).leg(1, "g").score(1, 0).build(),
            MatchBuilder::new("2", 1)
                .teams(&b, &a)
                .leg(2, "g")
                .score(1, 0)
                .penalties(5, 4)
                .build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert_eq!(cell.penalty, Some(ScorePair::new(4, 5)));
        assert_eq!(cell.winner(), Some(Side::Away));
    }

    #[test]
    fn legs_match_by_name_when_ids_are_missing() {
        let a = Participant {
            id: None,
            name: "Alpha".into(),
            image: None,
        };
        let b = Participant {
            id: None,
            name: "Bravo".into(),
            image: None,
        };
        let a_upper = Participant {
            name: "ALPHA".into(),
            ..a.clone()
        };
        let records = vec![
            MatchBuilder::new("1", 1).teams(&a, &b).leg(1, "g").score(0, 1).build(),
            MatchBuilder::new("2", 1).teams(&b, &a_upper).leg(2, "g").score(0, 3).build(),
        ];
        let cell = &build_bracket(&records, BracketScope::All).rounds[0].cells[0];
        assert_eq!(cell.winner(), Some(Side::Home));
    }

    #[test]
    fn rounds_are_named_from_distance_to_final() {
        let records = vec![
            MatchBuilder::new("1", 1).build(),
            MatchBuilder::new("2", 2).build(),
            MatchBuilder::new("3", 3).build(),
        ];
        let bracket = build_bracket(&records, BracketScope::All);
        assert_eq!(round_names(&bracket), ["Round 1", "Semi Final", "Final"]);

        let mut with_playoff = records;
        with_playoff.push(MatchBuilder::new("4", 3).third_place().build());
        let bracket = build_bracket(&with_playoff, BracketScope::All);
        assert_eq!(round_names(&bracket), ["Round 1", "Semi Final", "Finals"]);
    }

    #[test]
    fn explicit_round_name_wins() {
        let records = vec![
            MatchBuilder::new("1", 1).round_name("Play-in").build(),
            MatchBuilder::new("2", 2).build(),
        ];
        let bracket = build_bracket(&records, BracketScope::All);
        assert_eq!(round_names(&bracket), ["Play-in", "Final"]);
    }

    #[test]
    fn cells_order_by_match_index_with_unindexed_last() {
        let records = vec![
            MatchBuilder::new("1", 1).build(),
            MatchBuilder::new("2", 1).index(2).build(),
            MatchBuilder::new("3", 1).index(1).build(),
        ];
        let round = &build_bracket(&records, BracketScope::All).rounds[0];
        let ids: Vec<&str> = round
            .cells
            .iter()
            .map(|c| c.scores[0].match_id.as_str())
            .collect();
        assert_eq!(ids, ["3", "2", "1"]);
        assert_eq!(round.cells[2].match_index, UNINDEXED);
    }

    #[test]
    fn champion_comes_from_final_not_third_place() {
        let records = vec![
            MatchBuilder::new("1", 2)
                .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                .score(0, 1)
                .index(0)
                .build(),
            MatchBuilder::new("2", 2)
                .teams(&team("C", "Charlie"), &team("D", "Delta"))
                .score(4, 0)
                .index(1)
                .third_place()
                .build(),
        ];
        let bracket = build_bracket(&records, BracketScope::All);
        let Some(champion) = &bracket.champion else {
            panic!("final is decided");
        };
        assert_eq!(champion.id, Some(ParticipantId::from("B")));
        let Some(final_round) = bracket.final_round() else {
            panic!("one round expected");
        };
        assert!(final_round.third_place_cell().is_some());
    }

    #[test]
    fn unseeded_round_renders_placeholders_and_no_champion() {
        let records = vec![MatchBuilder::new("1", 1).build()];
        let bracket = build_bracket(&records, BracketScope::All);
        let cell = &bracket.rounds[0].cells[0];
        assert!(cell.home.is_none() && cell.away.is_none());
        assert!(bracket.champion.is_none());
    }

    #[test]
    fn knockout_scope_skips_group_stage() {
        let records = vec![
            MatchBuilder::new("1", 1).stage(Stage::Group).build(),
            MatchBuilder::new("2", 2).stage(Stage::Group).build(),
            MatchBuilder::new("3", 10).stage(Stage::Knockout).build(),
            MatchBuilder::new("4", 11).stage(Stage::Knockout).build(),
        ];
        let bracket = build_bracket(&records, BracketScope::KnockoutOnly);
        let rounds: Vec<u32> = bracket.rounds.iter().map(|r| r.round).collect();
        assert_eq!(rounds, [10, 11]);
        assert_eq!(round_names(&bracket), ["Semi Final", "Final"]);
    }

    #[test]
    fn malformed_details_never_block_building() {
        let mut record = MatchBuilder::new("1", 1)
            .teams(&team("A", "Alpha"), &team("B", "Bravo"))
            .score(1, 0)
            .build();
        record.details = MatchDetails::from_value(&serde_json::json!("{{broken"));
        let bracket = build_bracket(&[record], BracketScope::All);
        assert_eq!(round_names(&bracket), ["Final"]);
        assert!(bracket.champion.is_some());
    }

    #[test]
    fn building_is_idempotent_and_order_independent() {
        let a = team("A", "Alpha");
        let b = team("B", "Bravo");
        let records = vec![
            MatchBuilder::new("2", 1).teams(&b, &a).leg(2, "g").score(1, 1).build(),
            MatchBuilder::new("1", 1).teams(&a, &b).leg(1, "g").score(0, 0).penalties(3, 2).build(),
            MatchBuilder::new("3", 2).build(),
        ];
        let first = build_bracket(&records, BracketScope::All);
        let second = build_bracket(&records, BracketScope::All);
        assert_eq!(first, second);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(first, build_bracket(&reversed, BracketScope::All));
    }
}
