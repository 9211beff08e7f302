//! Match lifecycle controller.
//!
//! Every operator action is applied by [`transition`], a pure function of
//! the current [`LiveMatchState`] returning the next state together with
//! the backend calls ([`Effect`]s) to issue. Nothing here performs I/O;
//! the officiating service executes the effects.
//!
//! ```text
//! scheduled -> 1st_half -> halftime -> 2nd_half -> fulltime_pending
//!           -> [penalty shootout] -> finished -> completed
//! ```

use crate::backend::{MatchPatch, NewMatchEvent};
use crate::domain::live_state::HALF_LENGTH_SECS;
use crate::domain::match_event::{insert_by_minute, sort_by_minute};
use crate::domain::{
    EventId, EventKind, LiveMatchState, MatchEvent, MatchPhase, MatchRecord, Side, SyncOperation,
    UndoStack,
};
use crate::error::MatchError;

const HALF_MARKER_MS: u64 = HALF_LENGTH_SECS * 1000;
const FULLTIME_MARKER_MS: u64 = 2 * HALF_LENGTH_SECS * 1000;

/// An event entered by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Goal, own goal or card.
    pub kind: EventKind,
    /// Side of the player (for own goals, the conceding side).
    pub team: Side,
    /// Player name, picked from the lookup or typed in.
    pub player: String,
    /// Match minute; the running clock's minute when absent.
    pub minute: Option<u32>,
    /// Free-form detail (card colour, assist, ...).
    pub detail: Option<String>,
}

/// Operator and timer inputs to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Kick off the first half.
    StartMatch,
    /// Pause the running clock.
    Pause,
    /// Resume a paused clock.
    Resume,
    /// Wall-clock tick of `real_ms` milliseconds.
    Tick {
        /// Real milliseconds elapsed since the previous tick.
        real_ms: u64,
    },
    /// Blow the half-time whistle.
    EndFirstHalf,
    /// Kick off the second half.
    StartSecondHalf,
    /// End of regulation.
    EndSecondHalf,
    /// Open the penalty shootout.
    StartPenalties,
    /// Record one shootout kick.
    RecordPenalty {
        /// Kicking side.
        team: Side,
        /// Whether it was converted.
        scored: bool,
    },
    /// Mark the shootout finished and determine its winner.
    FinishPenalties,
    /// Compute the result; awaits confirmation.
    FinishMatch,
    /// Persist the result. Terminal.
    ConfirmResult,
    /// Record a match event.
    SubmitEvent(EventDraft),
    /// Authoritative record fetched from the backend.
    Reloaded(MatchRecord),
}

impl Action {
    /// Short name used in logs and rejections.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartMatch => "start match",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Tick { .. } => "tick",
            Self::EndFirstHalf => "end first half",
            Self::StartSecondHalf => "start second half",
            Self::EndSecondHalf => "end second half",
            Self::StartPenalties => "start penalties",
            Self::RecordPenalty { .. } => "record penalty",
            Self::FinishPenalties => "finish penalties",
            Self::FinishMatch => "finish match",
            Self::ConfirmResult => "confirm result",
            Self::SubmitEvent(_) => "submit event",
            Self::Reloaded(_) => "reload",
        }
    }

    /// Whether a snapshot is taken before the action, making it undoable.
    /// Clock housekeeping and reloads are not.
    #[must_use]
    pub const fn is_undoable(&self) -> bool {
        !matches!(
            self,
            Self::Pause | Self::Resume | Self::Tick { .. } | Self::Reloaded(_)
        )
    }
}

/// Backend call requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `PATCH /api/matches/{id}`.
    SyncStatus(MatchPatch),
    /// `POST /api/matches/{id}/events`.
    CreateEvent(NewMatchEvent),
    /// `DELETE /api/matches/{id}/events/last`.
    DeleteLastEvent,
    /// `GET /api/matches/{id}`, replacing the local record.
    Reload,
}

impl Effect {
    /// Backend operation reported when the effect fails.
    #[must_use]
    pub const fn operation(&self) -> SyncOperation {
        match self {
            Self::SyncStatus(_) => SyncOperation::UpdateStatus,
            Self::CreateEvent(_) => SyncOperation::CreateEvent,
            Self::DeleteLastEvent => SyncOperation::DeleteLastEvent,
            Self::Reload => SyncOperation::Reload,
        }
    }
}

fn invalid(state: &LiveMatchState, action: &Action) -> MatchError {
    MatchError::InvalidTransition {
        phase: state.phase,
        action: action.name(),
    }
}

fn enter(next: &mut LiveMatchState, phase: MatchPhase) -> Effect {
    next.phase = phase;
    let patch = MatchPatch::phase(phase);
    next.record.status = patch.status;
    next.record.period.clone_from(&patch.period);
    Effect::SyncStatus(patch)
}

/// Applies `action` to `state`.
///
/// # Errors
///
/// Returns a [`MatchError`] when the action is not permitted in the
/// current phase or fails validation. The state is left untouched.
pub fn transition(
    state: &LiveMatchState,
    action: &Action,
) -> Result<(LiveMatchState, Vec<Effect>), MatchError> {
    let mut next = state.clone();

    if state.phase == MatchPhase::Completed {
        return match action {
            Action::Tick { .. } => Ok((next, Vec::new())),
            Action::Reloaded(record) => {
                next.record = record.clone();
                sort_by_minute(&mut next.record.events);
                Ok((next, Vec::new()))
            }
            _ => Err(MatchError::MatchCompleted),
        };
    }

    let effects = match action {
        Action::StartMatch => {
            if state.phase != MatchPhase::Scheduled {
                return Err(invalid(state, action));
            }
            if !state.record.participants_resolved() {
                return Err(MatchError::ParticipantsNotReady);
            }
            next.record.home_score.get_or_insert(0);
            next.record.away_score.get_or_insert(0);
            next.clock.start_at(0);
            vec![enter(&mut next, MatchPhase::FirstHalf)]
        }
        Action::Pause => {
            if !state.phase.is_half() || !state.clock.is_running() {
                return Err(invalid(state, action));
            }
            next.clock.pause();
            Vec::new()
        }
        Action::Resume => {
            if !state.phase.is_half() || state.clock.is_running() {
                return Err(invalid(state, action));
            }
            next.clock.resume();
            Vec::new()
        }
        Action::Tick { real_ms } => {
            if state.phase.is_half() {
                next.clock.tick(*real_ms);
            }
            Vec::new()
        }
        Action::EndFirstHalf => {
            if state.phase != MatchPhase::FirstHalf {
                return Err(invalid(state, action));
            }
            next.clock.stop_at(HALF_MARKER_MS);
            vec![enter(&mut next, MatchPhase::Halftime)]
        }
        Action::StartSecondHalf => {
            if state.phase != MatchPhase::Halftime {
                return Err(invalid(state, action));
            }
            next.clock.start_at(HALF_MARKER_MS);
            vec![enter(&mut next, MatchPhase::SecondHalf)]
        }
        Action::EndSecondHalf => {
            if state.phase != MatchPhase::SecondHalf {
                return Err(invalid(state, action));
            }
            next.clock.stop_at(FULLTIME_MARKER_MS);
            vec![enter(&mut next, MatchPhase::FulltimePending)]
        }
        Action::StartPenalties => {
            if state.phase != MatchPhase::FulltimePending
                || state.shootout.active
                || state.aggregate().leader().is_some()
            {
                return Err(invalid(state, action));
            }
            next.shootout.active = true;
            Vec::new()
        }
        Action::RecordPenalty { team, scored } => {
            if state.phase != MatchPhase::FulltimePending {
                return Err(invalid(state, action));
            }
            if !state.shootout.active {
                return Err(MatchError::ShootoutNotActive);
            }
            if state.shootout.finished {
                return Err(MatchError::ShootoutAlreadyFinished);
            }
            next.shootout.record(*team, *scored);
            Vec::new()
        }
        Action::FinishPenalties => {
            if !state.shootout.active {
                return Err(MatchError::ShootoutNotActive);
            }
            if state.shootout.finished {
                return Err(MatchError::ShootoutAlreadyFinished);
            }
            if !state.shootout.can_finish() {
                return Err(MatchError::ShootoutUndecided);
            }
            next.shootout.finished = true;
            next.shootout.winner = state.shootout.tally().leader();
            Vec::new()
        }
        Action::FinishMatch => {
            if state.phase != MatchPhase::FulltimePending {
                return Err(invalid(state, action));
            }
            finish(&mut next)?;
            Vec::new()
        }
        Action::ConfirmResult => match state.phase {
            MatchPhase::FulltimePending => {
                finish(&mut next)?;
                confirm(&mut next)
            }
            MatchPhase::Finished => confirm(&mut next),
            _ => return Err(invalid(state, action)),
        },
        Action::SubmitEvent(draft) => submit(state, &mut next, draft)?,
        Action::Reloaded(record) => {
            next.record = record.clone();
            sort_by_minute(&mut next.record.events);
            if record.is_completed() {
                next.phase = MatchPhase::Completed;
                next.clock.stop_at(FULLTIME_MARKER_MS);
            }
            Vec::new()
        }
    };

    Ok((next, effects))
}

/// Decides the winner on aggregate, falling back to the shootout when
/// the result must be decisive.
fn finish(next: &mut LiveMatchState) -> Result<(), MatchError> {
    let winner = match next.aggregate().leader() {
        Some(side) => Some(side),
        None if next.shootout.active && !next.shootout.finished => {
            return Err(MatchError::ShootoutUndecided);
        }
        None if next.shootout.active => next.shootout.winner,
        None if next.decisive => return Err(MatchError::PenaltiesRequired),
        None => None,
    };
    if winner.is_none() && next.decisive {
        return Err(MatchError::ShootoutUndecided);
    }
    next.winner = winner;
    next.phase = MatchPhase::Finished;
    Ok(())
}

fn confirm(next: &mut LiveMatchState) -> Vec<Effect> {
    next.phase = MatchPhase::Completed;
    let patch = MatchPatch::completion(next);
    next.record.status = patch.status;
    next.record.period = None;
    if next.shootout.active {
        next.record.home_penalty_score = Some(next.shootout.home);
        next.record.away_penalty_score = Some(next.shootout.away);
    }
    vec![Effect::SyncStatus(patch), Effect::Reload]
}

fn submit(
    state: &LiveMatchState,
    next: &mut LiveMatchState,
    draft: &EventDraft,
) -> Result<Vec<Effect>, MatchError> {
    if !state.phase.accepts_events() {
        return Err(MatchError::InvalidTransition {
            phase: state.phase,
            action: "submit event",
        });
    }
    let player = draft.player.trim();
    if player.is_empty() {
        return Err(MatchError::MissingPlayer);
    }
    let minute = draft.minute.unwrap_or_else(|| state.clock.minute());

    let event = MatchEvent {
        id: EventId::temporary(),
        kind: draft.kind,
        team: draft.team,
        player: player.to_string(),
        minute,
        detail: draft.detail.clone(),
    };
    if let Some(side) = event.kind.scoring_side(event.team) {
        let slot = next.record.score_mut(side);
        *slot = Some(slot.unwrap_or(0).saturating_add(1));
    }
    insert_by_minute(&mut next.record.events, event);

    Ok(vec![
        Effect::CreateEvent(NewMatchEvent {
            kind: draft.kind,
            team: draft.team,
            player: player.to_string(),
            time: minute,
            detail: draft.detail.clone(),
        }),
        Effect::Reload,
    ])
}

/// Restores the most recent snapshot.
///
/// The running clock is kept when the snapshot belongs to the same half,
/// so undoing an event does not rewind match time. When the restored
/// state has fewer events, the last server event is deleted and the
/// record reloaded.
///
/// # Errors
///
/// Returns [`MatchError::RollbackUnavailable`] once the result has been
/// computed.
pub fn rollback(
    state: &LiveMatchState,
    undo: &mut UndoStack,
) -> Result<(LiveMatchState, Vec<Effect>), MatchError> {
    if matches!(state.phase, MatchPhase::Finished | MatchPhase::Completed) {
        return Err(MatchError::RollbackUnavailable);
    }

    let Some(mut restored) = undo.pop() else {
        if state.phase == MatchPhase::FulltimePending {
            let mut next = state.clone();
            next.clock.pause();
            let effect = enter(&mut next, MatchPhase::SecondHalf);
            return Ok((next, vec![effect]));
        }
        return Ok((state.clone(), Vec::new()));
    };

    if restored.phase == state.phase && state.phase.is_half() {
        restored.clock = state.clock;
    }

    let mut effects = Vec::new();
    if restored.event_count() < state.event_count() {
        effects.push(Effect::DeleteLastEvent);
    }
    if restored.phase != state.phase {
        effects.push(Effect::SyncStatus(MatchPatch::phase(restored.phase)));
    }
    if effects.contains(&Effect::DeleteLastEvent) {
        effects.push(Effect::Reload);
    }
    Ok((restored, effects))
}

/// Applies `action` in place, snapshotting first when it is undoable.
///
/// # Errors
///
/// Propagates the [`MatchError`] from [`transition`]; nothing is changed
/// in that case.
pub fn dispatch(
    state: &mut LiveMatchState,
    undo: &mut UndoStack,
    action: &Action,
) -> Result<Vec<Effect>, MatchError> {
    let (next, effects) = transition(state, action)?;
    let previous = std::mem::replace(state, next);
    if action.is_undoable() {
        undo.push(previous);
    }
    Ok(effects)
}

/// Rolls back in place.
///
/// # Errors
///
/// See [`rollback`].
pub fn revert(
    state: &mut LiveMatchState,
    stack: &mut UndoStack,
) -> Result<Vec<Effect>, MatchError> {
    let (next, effects) = rollback(state, stack)?;
    *state = next;
    Ok(effects)
}
