//! Officiating service: hosts one match lifecycle controller per session.
//!
//! Every mutation follows the same pattern: acquire the session lock →
//! apply the action through the controller → release the lock → emit
//! events → execute the requested backend calls. Backend failures are
//! logged and broadcast as [`SessionEvent::SyncFailed`]; the local state is
//! kept and the next forced reload reconciles it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::gating;
use super::match_controller::{self, Action, Effect, EventDraft};
use crate::backend::{BackendError, MatchBackend};
use crate::domain::{
    EventBus, LiveMatchState, MatchId, MatchPhase, MatchSession, ScorePair, SessionEvent,
    SessionRegistry, SessionSummary, SessionView, Side, TournamentFormat,
};
use crate::error::GatewayError;

/// Timing knobs of officiating sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficiatingSettings {
    /// Default real minutes per half.
    pub half_duration_minutes: u32,
    /// Wall-clock period of the clock ticker.
    pub tick_interval: Duration,
    /// How long a goal celebration stays up.
    pub celebration: Duration,
}

impl Default for OfficiatingSettings {
    fn default() -> Self {
        Self {
            half_duration_minutes: 45,
            tick_interval: Duration::from_secs(1),
            celebration: Duration::from_secs(3),
        }
    }
}

/// What an observer sees of a state, compared before and after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    phase: MatchPhase,
    score: ScorePair,
}

impl Observed {
    fn of(state: &LiveMatchState) -> Self {
        Self {
            phase: state.phase,
            score: state.score(),
        }
    }
}

/// Orchestration layer for officiating sessions.
#[derive(Debug, Clone)]
pub struct OfficiatingService {
    backend: Arc<dyn MatchBackend>,
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    settings: OfficiatingSettings,
}

impl OfficiatingService {
    /// Creates a new `OfficiatingService`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn MatchBackend>,
        registry: Arc<SessionRegistry>,
        event_bus: EventBus,
        settings: OfficiatingSettings,
    ) -> Self {
        Self {
            backend,
            registry,
            event_bus,
            settings,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns the timing settings.
    #[must_use]
    pub const fn settings(&self) -> &OfficiatingSettings {
        &self.settings
    }

    /// Opens an officiating session, or returns the one already open.
    ///
    /// Loads the match and its tournament, runs the officiating gates and
    /// starts the clock ticker.
    ///
    /// # Errors
    ///
    /// Returns a blocking [`crate::error::MatchError`] when prerequisites
    /// are not met, or a backend error if the match cannot be loaded.
    pub async fn open_session(
        &self,
        match_id: &MatchId,
        half_duration_minutes: Option<u32>,
    ) -> Result<SessionView, GatewayError> {
        if let Ok(existing) = self.registry.get(match_id).await {
            return Ok(SessionView::from(&*existing.read().await));
        }

        let record = self.backend.fetch_match(match_id).await?;
        let (all, format) = match &record.tournament_id {
            Some(tournament_id) => {
                let all = self.backend.fetch_tournament_matches(tournament_id).await?;
                let format = match self.backend.fetch_tournament(tournament_id).await {
                    Ok(tournament) => tournament.format,
                    Err(e) => {
                        tracing::warn!(
                            %match_id,
                            error = %e,
                            "tournament unavailable, assuming knockout"
                        );
                        TournamentFormat::Knockout
                    }
                };
                (all, format)
            }
            None => (vec![record.clone()], TournamentFormat::Knockout),
        };

        let first_leg = gating::check_prerequisites(&record, &all)?;
        let decisive = format.requires_decisive_result(&record.details);
        let half = half_duration_minutes.unwrap_or(self.settings.half_duration_minutes);
        let state = LiveMatchState::new(record, half, decisive, first_leg);
        let phase = state.phase;

        let (entry, inserted) = self.registry.insert_or_get(MatchSession::new(state)).await;
        let mut session = entry.write().await;
        if inserted {
            if phase != MatchPhase::Completed {
                session.ticker = Some(self.spawn_ticker(match_id.clone()));
            }
            let _ = self.event_bus.publish(SessionEvent::SessionOpened {
                match_id: match_id.clone(),
                phase,
                timestamp: Utc::now(),
            });
            tracing::info!(%match_id, %phase, decisive, half, "session opened");
        }
        Ok(SessionView::from(&*session))
    }

    /// Returns the current view of a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no session is open.
    pub async fn view(&self, match_id: &MatchId) -> Result<SessionView, GatewayError> {
        let entry = self.registry.get(match_id).await?;
        let session = entry.read().await;
        Ok(SessionView::from(&*session))
    }

    /// Lists open sessions ordered by match id.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry.list().await
    }

    /// Applies a clock, phase or shootout command.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] or the controller's
    /// rejection. Event submission goes through [`Self::submit_event`].
    pub async fn command(
        &self,
        match_id: &MatchId,
        action: Action,
    ) -> Result<SessionView, GatewayError> {
        if matches!(action, Action::SubmitEvent(_) | Action::Reloaded(_)) {
            return Err(GatewayError::InvalidRequest(format!(
                "{} is not a session command",
                action.name()
            )));
        }
        let effects = self.apply(match_id, &action).await?;
        tracing::info!(%match_id, action = action.name(), "command applied");
        self.execute(match_id, effects).await;
        self.view(match_id).await
    }

    /// Records a match event optimistically, creates it on the backend and
    /// reloads the authoritative record whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SubmitInFlight`] while a previous submission
    /// is pending, or the controller's rejection.
    pub async fn submit_event(
        &self,
        match_id: &MatchId,
        mut draft: EventDraft,
    ) -> Result<SessionView, GatewayError> {
        let entry = self.registry.get(match_id).await?;
        let (before, after, effects) = {
            let mut guard = entry.write().await;
            let session = &mut *guard;
            if session.submit_in_flight {
                return Err(GatewayError::SubmitInFlight(match_id.clone()));
            }
            draft.minute = Some(draft.minute.unwrap_or_else(|| session.state.clock.minute()));
            let before = Observed::of(&session.state);
            let effects = match_controller::dispatch(
                &mut session.state,
                &mut session.undo,
                &Action::SubmitEvent(draft.clone()),
            )?;
            session.submit_in_flight = true;
            session.last_modified_at = Utc::now();
            (before, Observed::of(&session.state), effects)
        };

        let minute = draft.minute.unwrap_or(1);
        let player = draft.player.trim().to_string();
        let _ = self.event_bus.publish(SessionEvent::EventRecorded {
            match_id: match_id.clone(),
            kind: draft.kind,
            team: draft.team,
            player: player.clone(),
            minute,
            timestamp: Utc::now(),
        });
        self.publish_changes(match_id, before, after);
        if let Some(scoring) = draft.kind.scoring_side(draft.team) {
            self.celebrate(match_id, scoring, player);
        }
        tracing::info!(
            %match_id,
            kind = draft.kind.as_str(),
            team = %draft.team,
            minute,
            "event submitted"
        );

        self.execute(match_id, effects).await;

        if let Ok(entry) = self.registry.get(match_id).await {
            entry.write().await.submit_in_flight = false;
        }
        self.view(match_id).await
    }

    /// Undoes the most recent undoable action.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MatchError::RollbackUnavailable`] once the
    /// result has been computed.
    pub async fn rollback(&self, match_id: &MatchId) -> Result<SessionView, GatewayError> {
        let entry = self.registry.get(match_id).await?;
        let (before, after, effects) = {
            let mut guard = entry.write().await;
            let session = &mut *guard;
            let before = Observed::of(&session.state);
            let effects = match_controller::revert(&mut session.state, &mut session.undo)?;
            session.last_modified_at = Utc::now();
            (before, Observed::of(&session.state), effects)
        };

        let _ = self.event_bus.publish(SessionEvent::RolledBack {
            match_id: match_id.clone(),
            phase: after.phase,
            timestamp: Utc::now(),
        });
        self.publish_changes(match_id, before, after);
        tracing::info!(%match_id, phase = %after.phase, effects = effects.len(), "rolled back");

        self.execute(match_id, effects).await;
        self.view(match_id).await
    }

    /// Closes a session and cancels its timers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no session is open.
    pub async fn close_session(&self, match_id: &MatchId) -> Result<(), GatewayError> {
        let entry = self.registry.remove(match_id).await?;
        entry.write().await.cancel_ticker();
        let _ = self.event_bus.publish(SessionEvent::SessionClosed {
            match_id: match_id.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, "session closed");
        Ok(())
    }

    async fn apply(
        &self,
        match_id: &MatchId,
        action: &Action,
    ) -> Result<Vec<Effect>, GatewayError> {
        let entry = self.registry.get(match_id).await?;
        let (before, after, effects, kick) = {
            let mut guard = entry.write().await;
            let session = &mut *guard;
            let before = Observed::of(&session.state);
            let effects =
                match_controller::dispatch(&mut session.state, &mut session.undo, action)?;
            session.last_modified_at = Utc::now();
            if session.state.phase == MatchPhase::Completed {
                session.cancel_ticker();
            }
            let shootout = &session.state.shootout;
            let kick = shootout.history.last().copied().map(|k| (k, shootout.tally()));
            (before, Observed::of(&session.state), effects, kick)
        };

        if let (Action::RecordPenalty { .. }, Some((kick, tally))) = (action, kick) {
            let _ = self.event_bus.publish(SessionEvent::PenaltyKickRecorded {
                match_id: match_id.clone(),
                team: kick.team,
                scored: kick.scored,
                home: tally.home,
                away: tally.away,
            });
        }
        self.publish_changes(match_id, before, after);
        Ok(effects)
    }

    fn publish_changes(&self, match_id: &MatchId, before: Observed, after: Observed) {
        if before.phase != after.phase {
            let _ = self.event_bus.publish(SessionEvent::PhaseChanged {
                match_id: match_id.clone(),
                from: before.phase,
                to: after.phase,
                timestamp: Utc::now(),
            });
        }
        if before.score != after.score {
            let _ = self.event_bus.publish(SessionEvent::ScoreChanged {
                match_id: match_id.clone(),
                home: after.score.home,
                away: after.score.away,
                timestamp: Utc::now(),
            });
        }
    }

    /// Runs effects in order. A failure never stops the remaining effects,
    /// so the trailing reload always happens.
    async fn execute(&self, match_id: &MatchId, effects: Vec<Effect>) {
        for effect in effects {
            let result = match &effect {
                Effect::SyncStatus(patch) => self.backend.update_match(match_id, patch).await,
                Effect::CreateEvent(body) => {
                    self.backend.create_event(match_id, body).await.map(|_| ())
                }
                Effect::DeleteLastEvent => self.backend.delete_last_event(match_id).await,
                Effect::Reload => self.reload(match_id).await,
            };
            if let Err(e) = result {
                let operation = effect.operation();
                tracing::warn!(%match_id, ?operation, error = %e, "backend sync failed");
                let _ = self.event_bus.publish(SessionEvent::SyncFailed {
                    match_id: match_id.clone(),
                    operation,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Replaces the local record with the backend's. Last response wins.
    async fn reload(&self, match_id: &MatchId) -> Result<(), BackendError> {
        let record = self.backend.fetch_match(match_id).await?;
        let Ok(entry) = self.registry.get(match_id).await else {
            tracing::debug!(%match_id, "session closed before reload completed");
            return Ok(());
        };
        let (before, after) = {
            let mut guard = entry.write().await;
            let session = &mut *guard;
            let before = Observed::of(&session.state);
            if let Err(e) = match_controller::dispatch(
                &mut session.state,
                &mut session.undo,
                &Action::Reloaded(record),
            ) {
                tracing::warn!(%match_id, error = %e, "reload rejected");
            }
            if session.state.phase == MatchPhase::Completed {
                session.cancel_ticker();
            }
            (before, Observed::of(&session.state))
        };
        self.publish_changes(match_id, before, after);
        Ok(())
    }

    fn celebrate(&self, match_id: &MatchId, team: Side, player: String) {
        let _ = self.event_bus.publish(SessionEvent::GoalCelebrationStarted {
            match_id: match_id.clone(),
            team,
            player,
        });
        let bus = self.event_bus.clone();
        let match_id = match_id.clone();
        let duration = self.settings.celebration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = bus.publish(SessionEvent::GoalCelebrationEnded { match_id });
        });
    }

    /// Drives the session clock. Looks the session up on every tick and
    /// stops once it is gone.
    fn spawn_ticker(&self, match_id: MatchId) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let bus = self.event_bus.clone();
        let period = self.settings.tick_interval.max(Duration::from_millis(1));
        let real_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Ok(entry) = registry.get(&match_id).await else {
                    break;
                };
                let clock = {
                    let mut guard = entry.write().await;
                    let session = &mut *guard;
                    if !session.state.phase.is_half() || !session.state.clock.is_running() {
                        continue;
                    }
                    let tick = Action::Tick { real_ms };
                    if match_controller::dispatch(&mut session.state, &mut session.undo, &tick)
                        .is_err()
                    {
                        continue;
                    }
                    session.state.clock
                };
                tracing::trace!(%match_id, clock = %clock.display(), "tick");
                let _ = bus.publish(SessionEvent::ClockTicked {
                    match_id: match_id.clone(),
                    elapsed_secs: clock.elapsed_secs(),
                    display: clock.display(),
                });
            }
        })
    }
}
