//! Officiating prerequisites.
//!
//! A match may only be officiated once both participants are known, every
//! match of the preceding round is completed, and, for the return leg of
//! a two-legged tie, the first leg is completed. The first leg is returned
//! so the controller can track the aggregate.

use crate::domain::{MatchRecord, Side};
use crate::error::MatchError;

/// Both sides must be assigned.
///
/// # Errors
///
/// Returns [`MatchError::ParticipantsNotReady`] while either side is TBD.
pub fn check_participants(record: &MatchRecord) -> Result<(), MatchError> {
    if record.participants_resolved() {
        Ok(())
    } else {
        Err(MatchError::ParticipantsNotReady)
    }
}

/// Every match of the immediately preceding round must be completed.
///
/// Rounds are taken from the sorted unique round numbers of the whole
/// tournament, so numbering gaps are skipped rather than assumed to be
/// `n - 1`, and the first knockout round waits for the last group round.
///
/// # Errors
///
/// Returns [`MatchError::PreviousRoundIncomplete`] naming the blocking
/// round.
pub fn check_previous_round(record: &MatchRecord, all: &[MatchRecord]) -> Result<(), MatchError> {
    let Some(previous) = all
        .iter()
        .map(|m| m.round)
        .filter(|round| *round < record.round)
        .max()
    else {
        return Ok(());
    };

    let blocked = all
        .iter()
        .any(|m| m.round == previous && !m.is_completed());
    if blocked {
        tracing::debug!(match_id = %record.id, round = previous, "previous round incomplete");
        Err(MatchError::PreviousRoundIncomplete { round: previous })
    } else {
        Ok(())
    }
}

/// Returns `true` for the return leg of a two-legged tie.
#[must_use]
pub fn is_return_leg(record: &MatchRecord) -> bool {
    record.details.leg.is_some_and(|leg| leg >= 2)
}

/// Finds the first leg of `record`'s tie: the leg-1 record of the same
/// round sharing its `groupId`, or failing that, the match of the same
/// round with the home/away pairing reversed.
#[must_use]
pub fn find_first_leg<'a>(record: &MatchRecord, all: &'a [MatchRecord]) -> Option<&'a MatchRecord> {
    let candidates = || {
        all.iter().filter(|m| {
            m.id != record.id && m.round == record.round && m.details.leg.unwrap_or(1) == 1
        })
    };

    if let Some(group) = &record.details.group_id
        && let Some(leg) = candidates().find(|m| m.details.group_id.as_ref() == Some(group))
    {
        return Some(leg);
    }

    let home = record.participant(Side::Home)?;
    let away = record.participant(Side::Away)?;
    candidates().find(|m| {
        let reversed_home = m.participant(Side::Home).is_some_and(|p| p.same_as(&away));
        let reversed_away = m.participant(Side::Away).is_some_and(|p| p.same_as(&home));
        reversed_home && reversed_away
    })
}

/// For a return leg, requires a completed first leg and returns it.
///
/// # Errors
///
/// Returns [`MatchError::FirstLegIncomplete`], carrying the first leg's id
/// when it exists, if it is missing or not completed.
pub fn check_first_leg(
    record: &MatchRecord,
    all: &[MatchRecord],
) -> Result<Option<MatchRecord>, MatchError> {
    if !is_return_leg(record) {
        return Ok(None);
    }
    match find_first_leg(record, all) {
        Some(leg) if leg.is_completed() && leg.has_result() => Ok(Some(leg.clone())),
        Some(leg) => Err(MatchError::FirstLegIncomplete {
            first_leg: Some(leg.id.clone()),
        }),
        None => Err(MatchError::FirstLegIncomplete { first_leg: None }),
    }
}

/// Runs every gate in order and returns the first leg, if any.
///
/// Completed matches open read-only and skip the gates, but still load the
/// first leg so the aggregate can be displayed.
///
/// # Errors
///
/// Returns the first blocking [`MatchError`].
pub fn check_prerequisites(
    record: &MatchRecord,
    all: &[MatchRecord],
) -> Result<Option<MatchRecord>, MatchError> {
    if record.is_completed() {
        return Ok(find_first_leg(record, all)
            .filter(|_| is_return_leg(record))
            .cloned());
    }
    check_participants(record)?;
    check_previous_round(record, all)?;
    check_first_leg(record, all)
}
