//! Local state of one officiated match.
//!
//! [`LiveMatchState`] is a plain value: the controller derives a new state
//! from the previous one for every action, and the undo stack stores
//! whole states as snapshots.

use std::fmt;

use serde::Serialize;

use super::bracket::ScorePair;
use super::match_record::{MatchRecord, MatchStatus, Side};

/// Regulation length of one half, in match seconds.
pub const HALF_LENGTH_SECS: u64 = 45 * 60;

const HALF_LENGTH_MINUTES: u64 = 45;

/// Local lifecycle phase. Finer grained than [`MatchStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchPhase {
    /// Not kicked off.
    #[serde(rename = "scheduled")]
    Scheduled,
    /// First half running.
    #[serde(rename = "1st_half")]
    FirstHalf,
    /// Break between halves.
    #[serde(rename = "halftime")]
    Halftime,
    /// Second half running.
    #[serde(rename = "2nd_half")]
    SecondHalf,
    /// Regulation over; result not computed yet.
    #[serde(rename = "fulltime_pending")]
    FulltimePending,
    /// Result computed locally, awaiting confirmation.
    #[serde(rename = "finished")]
    Finished,
    /// Result confirmed and persisted. Terminal.
    #[serde(rename = "completed")]
    Completed,
}

impl MatchPhase {
    /// Local phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::FirstHalf => "1st_half",
            Self::Halftime => "halftime",
            Self::SecondHalf => "2nd_half",
            Self::FulltimePending => "fulltime_pending",
            Self::Finished => "finished",
            Self::Completed => "completed",
        }
    }

    /// Server vocabulary for this phase: status plus optional period.
    #[must_use]
    pub const fn server_status(self) -> (MatchStatus, Option<&'static str>) {
        match self {
            Self::Scheduled => (MatchStatus::Scheduled, None),
            Self::FirstHalf => (MatchStatus::Live, Some("1st_half")),
            Self::Halftime => (MatchStatus::Live, Some("halftime")),
            Self::SecondHalf => (MatchStatus::Live, Some("2nd_half")),
            Self::FulltimePending => (MatchStatus::Live, Some("fulltime")),
            Self::Finished | Self::Completed => (MatchStatus::Completed, None),
        }
    }

    /// Maps a server status back to a local phase, used when a session is
    /// opened for a match that is already in progress.
    #[must_use]
    pub fn from_server(status: MatchStatus, period: Option<&str>) -> Self {
        match status {
            MatchStatus::Scheduled => Self::Scheduled,
            MatchStatus::Completed => Self::Completed,
            MatchStatus::Live => match period {
                Some("halftime") => Self::Halftime,
                Some("2nd_half") => Self::SecondHalf,
                Some("fulltime") => Self::FulltimePending,
                _ => Self::FirstHalf,
            },
        }
    }

    /// Returns `true` while a half is being played.
    #[must_use]
    pub const fn is_half(self) -> bool {
        matches!(self, Self::FirstHalf | Self::SecondHalf)
    }

    /// Returns `true` when events may be recorded.
    #[must_use]
    pub const fn accepts_events(self) -> bool {
        matches!(
            self,
            Self::FirstHalf | Self::Halftime | Self::SecondHalf | Self::FulltimePending
        )
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scaled match clock.
///
/// Real time accumulated while running is scaled by
/// `45 / half_duration_minutes`, so an abbreviated six-minute half still
/// spans 45 match minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchClock {
    half_duration_minutes: u32,
    offset_ms: u64,
    real_ms: u64,
    running: bool,
}

impl MatchClock {
    /// Creates a stopped clock at 00:00. Durations below one minute are
    /// raised to one.
    #[must_use]
    pub fn new(half_duration_minutes: u32) -> Self {
        Self {
            half_duration_minutes: half_duration_minutes.max(1),
            offset_ms: 0,
            real_ms: 0,
            running: false,
        }
    }

    /// Real minutes per half.
    #[must_use]
    pub const fn half_duration_minutes(&self) -> u32 {
        self.half_duration_minutes
    }

    /// Elapsed match time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        let scaled = self.real_ms.saturating_mul(HALF_LENGTH_MINUTES)
            / u64::from(self.half_duration_minutes);
        self.offset_ms.saturating_add(scaled)
    }

    /// Elapsed match time in whole seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms() / 1000
    }

    /// Current match minute, 1-based (`00:30` is the 1st minute).
    #[must_use]
    pub fn minute(&self) -> u32 {
        u32::try_from(self.elapsed_secs() / 60)
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// `mm:ss` rendering of the elapsed time.
    #[must_use]
    pub fn display(&self) -> String {
        let secs = self.elapsed_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Whether the clock advances on ticks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Restarts the clock from a marker (`0` or the half-time marker).
    pub fn start_at(&mut self, marker_ms: u64) {
        self.offset_ms = marker_ms;
        self.real_ms = 0;
        self.running = true;
    }

    /// Stops the clock and pins it to a marker.
    pub fn stop_at(&mut self, marker_ms: u64) {
        self.offset_ms = marker_ms;
        self.real_ms = 0;
        self.running = false;
    }

    /// Pauses without losing elapsed time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resumes after a pause.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Advances by `real_ms` of wall-clock time if running.
    pub fn tick(&mut self, real_ms: u64) {
        if self.running {
            self.real_ms = self.real_ms.saturating_add(real_ms);
        }
    }
}

/// One shootout kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PenaltyKick {
    /// Kicking side.
    pub team: Side,
    /// Whether the kick was converted.
    pub scored: bool,
}

/// Penalty shootout tally and history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PenaltyShootout {
    /// Shootout started (`showPenalties`).
    pub active: bool,
    /// Home conversions.
    pub home: u32,
    /// Away conversions.
    pub away: u32,
    /// Kicks in order.
    pub history: Vec<PenaltyKick>,
    /// Marked finished by the operator.
    pub finished: bool,
    /// Winner determined when finishing, if the tally is not level.
    pub winner: Option<Side>,
}

impl PenaltyShootout {
    /// Records a kick.
    pub fn record(&mut self, team: Side, scored: bool) {
        if scored {
            match team {
                Side::Home => self.home = self.home.saturating_add(1),
                Side::Away => self.away = self.away.saturating_add(1),
            }
        }
        self.history.push(PenaltyKick { team, scored });
    }

    /// Whether the operator may mark the shootout finished: at least two
    /// kicks taken, or the tally already differs.
    #[must_use]
    pub fn can_finish(&self) -> bool {
        self.history.len() >= 2 || self.home != self.away
    }

    /// Current tally.
    #[must_use]
    pub const fn tally(&self) -> ScorePair {
        ScorePair::new(self.home, self.away)
    }
}

/// Full local state of one officiated match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMatchState {
    /// Local mirror of the server record.
    pub record: MatchRecord,
    /// Local phase.
    pub phase: MatchPhase,
    /// Match clock.
    pub clock: MatchClock,
    /// Shootout sub-state.
    pub shootout: PenaltyShootout,
    /// Winner computed when the match was finished.
    pub winner: Option<Side>,
    /// A level score must be broken by a shootout.
    pub decisive: bool,
    /// Completed first leg, when officiating a second leg.
    pub first_leg: Option<MatchRecord>,
}

impl LiveMatchState {
    /// Creates the state for a freshly opened session.
    #[must_use]
    pub fn new(
        record: MatchRecord,
        half_duration_minutes: u32,
        decisive: bool,
        first_leg: Option<MatchRecord>,
    ) -> Self {
        let phase = MatchPhase::from_server(record.status, record.period.as_deref());
        let mut clock = MatchClock::new(half_duration_minutes);
        match phase {
            MatchPhase::Halftime | MatchPhase::SecondHalf => {
                clock.stop_at(HALF_LENGTH_SECS * 1000);
            }
            MatchPhase::FulltimePending | MatchPhase::Finished | MatchPhase::Completed => {
                clock.stop_at(2 * HALF_LENGTH_SECS * 1000);
            }
            MatchPhase::Scheduled | MatchPhase::FirstHalf => {}
        }
        let shootout = PenaltyShootout {
            home: record.home_penalty_score.unwrap_or(0),
            away: record.away_penalty_score.unwrap_or(0),
            active: record.has_penalties(),
            ..PenaltyShootout::default()
        };
        Self {
            record,
            phase,
            clock,
            shootout,
            winner: None,
            decisive,
            first_leg,
        }
    }

    /// Current regulation score, unplayed sides counting as zero.
    #[must_use]
    pub fn score(&self) -> ScorePair {
        ScorePair::new(
            self.record.home_score.unwrap_or(0),
            self.record.away_score.unwrap_or(0),
        )
    }

    /// Score used to decide the match: the current score plus the first
    /// leg's contribution of each participant, matched by identity since
    /// sides swap between legs.
    #[must_use]
    pub fn aggregate(&self) -> ScorePair {
        let mut total = self.score();
        let Some(first_leg) = &self.first_leg else {
            return total;
        };
        for side in [Side::Home, Side::Away] {
            let carried = self
                .record
                .participant(side)
                .and_then(|who| first_leg.side_of(&who))
                .and_then(|leg_side| first_leg.score(leg_side))
                .unwrap_or(0);
            match side {
                Side::Home => total.home = total.home.saturating_add(carried),
                Side::Away => total.away = total.away.saturating_add(carried),
            }
        }
        total
    }

    /// Number of events in the local log.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.record.events.len()
    }
}

/// In-memory undo stack of state snapshots.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    snapshots: Vec<LiveMatchState>,
}

impl UndoStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a snapshot.
    pub fn push(&mut self, snapshot: LiveMatchState) {
        self.snapshots.push(snapshot);
    }

    /// Pops the most recent snapshot.
    pub fn pop(&mut self) -> Option<LiveMatchState> {
        self.snapshots.pop()
    }

    /// Number of snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if nothing can be undone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviated_half_scales_to_full_minutes() {
        let mut clock = MatchClock::new(6);
        clock.start_at(0);
        for _ in 0..6 {
            clock.tick(1000);
        }
        assert_eq!(clock.elapsed_secs(), 45);
    }

    #[test]
    fn full_length_half_runs_in_real_time() {
        let mut clock = MatchClock::new(45);
        clock.start_at(0);
        clock.tick(90_000);
        assert_eq!(clock.display(), "01:30");
        assert_eq!(clock.minute(), 2);
    }

    #[test]
    fn pause_keeps_elapsed_time() {
        let mut clock = MatchClock::new(45);
        clock.start_at(0);
        clock.tick(10_000);
        clock.pause();
        clock.tick(50_000);
        assert_eq!(clock.elapsed_secs(), 10);
        clock.resume();
        clock.tick(5_000);
        assert_eq!(clock.elapsed_secs(), 15);
    }

    #[test]
    fn second_half_starts_at_marker() {
        let mut clock = MatchClock::new(45);
        clock.start_at(HALF_LENGTH_SECS * 1000);
        assert_eq!(clock.display(), "45:00");
        assert_eq!(clock.minute(), 46);
    }

    #[test]
    fn zero_half_duration_is_clamped() {
        assert_eq!(MatchClock::new(0).half_duration_minutes(), 1);
    }

    #[test]
    fn shootout_finish_heuristic() {
        let mut shootout = PenaltyShootout::default();
        assert!(!shootout.can_finish());
        shootout.record(Side::Home, false);
        assert!(!shootout.can_finish());
        shootout.record(Side::Away, true);
        assert!(shootout.can_finish());
        assert_eq!(shootout.tally(), ScorePair::new(0, 1));
    }

    #[test]
    fn server_period_mapping() {
        assert_eq!(
            MatchPhase::from_server(MatchStatus::Live, Some("fulltime")),
            MatchPhase::FulltimePending
        );
        assert_eq!(
            MatchPhase::from_server(MatchStatus::Live, None),
            MatchPhase::FirstHalf
        );
        assert_eq!(
            MatchPhase::FulltimePending.server_status(),
            (MatchStatus::Live, Some("fulltime"))
        );
        assert_eq!(
            MatchPhase::Finished.server_status(),
            (MatchStatus::Completed, None)
        );
    }
}
