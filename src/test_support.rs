//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::app_state::AppState;
use crate::backend::MatchBackend;
use crate::backend::memory::InMemoryBackend;
use crate::domain::{
    MatchDetails, MatchId, MatchRecord, MatchStatus, Participant, ParticipantId, Stage,
    TournamentId,
};
use crate::service::OfficiatingSettings;

/// Fluent builder for [`MatchRecord`] fixtures.
#[derive(Debug, Clone)]
pub(crate) struct MatchBuilder {
    record: MatchRecord,
}

pub(crate) fn team(id: &str, name: &str) -> Participant {
    Participant {
        id: Some(ParticipantId::from(id)),
        name: name.to_string(),
        image: None,
    }
}

impl MatchBuilder {
    pub(crate) fn new(id: &str, round: u32) -> Self {
        Self {
            record: MatchRecord {
                id: MatchId::from(id),
                tournament_id: Some(TournamentId::from("t1")),
                round,
                home_participant_id: None,
                away_participant_id: None,
                home_participant: None,
                away_participant: None,
                home_score: None,
                away_score: None,
                home_penalty_score: None,
                away_penalty_score: None,
                status: MatchStatus::Scheduled,
                period: None,
                details: MatchDetails::default(),
                events: Vec::new(),
            },
        }
    }

    pub(crate) fn teams(mut self, home: &Participant, away: &Participant) -> Self {
        self.record.home_participant_id.clone_from(&home.id);
        self.record.away_participant_id.clone_from(&away.id);
        self.record.home_participant = Some(home.clone());
        self.record.away_participant = Some(away.clone());
        self
    }

    pub(crate) fn score(mut self, home: u32, away: u32) -> Self {
        self.record.home_score = Some(home);
        self.record.away_score = Some(away);
        self
    }

    pub(crate) fn penalties(mut self, home: u32, away: u32) -> Self {
        self.record.home_penalty_score = Some(home);
        self.record.away_penalty_score = Some(away);
        self
    }

    pub(crate) fn completed(mut self) -> Self {
        self.record.status = MatchStatus::Completed;
        self
    }

    pub(crate) fn live(mut self, period: &str) -> Self {
        self.record.status = MatchStatus::Live;
        self.record.period = Some(period.to_string());
        self
    }

    pub(crate) fn leg(mut self, leg: u8, group_id: &str) -> Self {
        self.record.details.leg = Some(leg);
        self.record.details.group_id = Some(group_id.to_string());
        self
    }

    pub(crate) fn index(mut self, match_index: u32) -> Self {
        self.record.details.match_index = Some(match_index);
        self
    }

    pub(crate) fn third_place(mut self) -> Self {
        self.record.details.is_third_place = true;
        self
    }

    pub(crate) fn round_name(mut self, name: &str) -> Self {
        self.record.details.round_name = Some(name.to_string());
        self
    }

    pub(crate) fn stage(mut self, stage: Stage) -> Self {
        self.record.details.stage = Some(stage);
        self
    }

    pub(crate) fn build(self) -> MatchRecord {
        self.record
    }
}

/// Full application over an in-memory backend with fast timers.
pub(crate) fn test_app(backend: &Arc<InMemoryBackend>) -> Router {
    let shared: Arc<dyn MatchBackend> = Arc::<InMemoryBackend>::clone(backend);
    let settings = OfficiatingSettings {
        half_duration_minutes: 45,
        tick_interval: Duration::from_millis(50),
        celebration: Duration::from_millis(20),
    };
    let state = AppState::new(shared, crate::domain::EventBus::new(64), settings);
    crate::api::build_app(state, Duration::from_secs(5))
}
