//! In-memory backend used by tests.
//!
//! Mimics the tournament backend closely enough for the officiating flow:
//! event creation and deletion recompute the stored score, and every call
//! is logged so tests can assert on the exact sequence of requests.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{BackendError, BackendFuture, MatchBackend, MatchPatch, NewMatchEvent};
use crate::domain::match_event::insert_by_minute;
use crate::domain::{EventId, MatchEvent, MatchId, MatchRecord, Tournament, TournamentId};

#[derive(Debug, Default)]
struct Store {
    matches: HashMap<MatchId, MatchRecord>,
    tournaments: HashMap<TournamentId, Tournament>,
    created: HashMap<MatchId, Vec<EventId>>,
    calls: Vec<String>,
    next_event_id: u64,
    fail_writes: bool,
}

/// Backend double holding records in memory.
#[derive(Debug, Default)]
pub(crate) struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn put_match(&self, record: MatchRecord) {
        let mut store = self.store.lock().await;
        store.matches.insert(record.id.clone(), record);
    }

    pub(crate) async fn put_tournament(&self, tournament: Tournament) {
        let mut store = self.store.lock().await;
        store.tournaments.insert(tournament.id.clone(), tournament);
    }

    pub(crate) async fn stored(&self, match_id: &MatchId) -> Option<MatchRecord> {
        self.store.lock().await.matches.get(match_id).cloned()
    }

    /// Makes every write fail with a 503 until reset.
    pub(crate) async fn fail_writes(&self, fail: bool) {
        self.store.lock().await.fail_writes = fail;
    }

    /// Number of logged calls starting with `prefix`.
    pub(crate) async fn call_count(&self, prefix: &str) -> usize {
        self.store
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

fn unavailable(url: String) -> BackendError {
    BackendError::Status { url, status: 503 }
}

impl MatchBackend for InMemoryBackend {
    fn fetch_match<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, MatchRecord> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.calls.push(format!("GET match {match_id}"));
            store
                .matches
                .get(match_id)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(format!("/api/matches/{match_id}")))
        })
    }

    fn update_match<'a>(
        &'a self,
        match_id: &'a MatchId,
        patch: &'a MatchPatch,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.calls.push(format!("PATCH match {match_id}"));
            if store.fail_writes {
                return Err(unavailable(format!("/api/matches/{match_id}")));
            }
            let record = store
                .matches
                .get_mut(match_id)
                .ok_or_else(|| BackendError::NotFound(format!("/api/matches/{match_id}")))?;
            record.status = patch.status;
            record.period.clone_from(&patch.period);
            if patch.home_score.is_some() {
                record.home_score = patch.home_score;
            }
            if patch.away_score.is_some() {
                record.away_score = patch.away_score;
            }
            record.home_penalty_score = patch.home_penalty_score.or(record.home_penalty_score);
            record.away_penalty_score = patch.away_penalty_score.or(record.away_penalty_score);
            Ok(())
        })
    }

    fn create_event<'a>(
        &'a self,
        match_id: &'a MatchId,
        event: &'a NewMatchEvent,
    ) -> BackendFuture<'a, MatchEvent> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.calls.push(format!("POST event {match_id}"));
            if store.fail_writes {
                return Err(unavailable(format!("/api/matches/{match_id}/events")));
            }
            store.next_event_id += 1;
            let created = MatchEvent {
                id: EventId::new(store.next_event_id.to_string()),
                kind: event.kind,
                team: event.team,
                player: event.player.clone(),
                minute: event.time,
                detail: event.detail.clone(),
            };
            let record = store
                .matches
                .get_mut(match_id)
                .ok_or_else(|| BackendError::NotFound(format!("/api/matches/{match_id}")))?;
            if let Some(side) = created.kind.scoring_side(created.team) {
                let slot = record.score_mut(side);
                *slot = Some(slot.unwrap_or(0) + 1);
            }
            insert_by_minute(&mut record.events, created.clone());
            store
                .created
                .entry(match_id.clone())
                .or_default()
                .push(created.id.clone());
            Ok(created)
        })
    }

    fn delete_last_event<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.calls.push(format!("DELETE event {match_id}"));
            if store.fail_writes {
                return Err(unavailable(format!("/api/matches/{match_id}/events/last")));
            }
            let Some(last) = store.created.get_mut(match_id).and_then(Vec::pop) else {
                return Err(BackendError::NotFound(format!(
                    "/api/matches/{match_id}/events/last"
                )));
            };
            let record = store
                .matches
                .get_mut(match_id)
                .ok_or_else(|| BackendError::NotFound(format!("/api/matches/{match_id}")))?;
            if let Some(pos) = record.events.iter().position(|e| e.id == last) {
                let removed = record.events.remove(pos);
                if let Some(side) = removed.kind.scoring_side(removed.team) {
                    let slot = record.score_mut(side);
                    *slot = Some(slot.unwrap_or(0).saturating_sub(1));
                }
            }
            Ok(())
        })
    }

    fn fetch_tournament_matches<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Vec<MatchRecord>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.calls.push(format!("GET matches {tournament_id}"));
            let mut records: Vec<MatchRecord> = store
                .matches
                .values()
                .filter(|m| m.tournament_id.as_ref() == Some(tournament_id))
                .cloned()
                .collect();
            records.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(records)
        })
    }

    fn fetch_tournament<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Tournament> {
        Box::pin(async move {
            let store = self.store.lock().await;
            store
                .tournaments
                .get(tournament_id)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(format!("/api/tournaments/{tournament_id}")))
        })
    }
}
