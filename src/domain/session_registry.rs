//! Concurrent session storage with per-session locking.
//!
//! [`SessionRegistry`] stores all open officiating sessions in a `HashMap`
//! where each entry is individually protected by a
//! [`tokio::sync::RwLock`], so ticks and commands on one match never
//! contend with another match.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::MatchId;
use super::match_session::{MatchSession, SessionSummary};
use crate::error::GatewayError;

/// Central store for all open sessions.
///
/// # Concurrency
///
/// - Reads of the same session run concurrently.
/// - Mutations of different sessions run concurrently.
/// - Mutations of the same session are serialized.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<MatchId, Arc<RwLock<MatchSession>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session, or returns the one already open for the match.
    ///
    /// The boolean is `true` when the given session was inserted.
    pub async fn insert_or_get(&self, session: MatchSession) -> (Arc<RwLock<MatchSession>>, bool) {
        let mut map = self.sessions.write().await;
        if let Some(existing) = map.get(&session.match_id) {
            return (Arc::clone(existing), false);
        }
        let match_id = session.match_id.clone();
        let entry = Arc::new(RwLock::new(session));
        map.insert(match_id, Arc::clone(&entry));
        (entry, true)
    }

    /// Returns the session behind its lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no session is open for
    /// the match.
    pub async fn get(&self, match_id: &MatchId) -> Result<Arc<RwLock<MatchSession>>, GatewayError> {
        let map = self.sessions.read().await;
        map.get(match_id)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(match_id.clone()))
    }

    /// Removes a session, returning its lock handle.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no session is open for
    /// the match.
    pub async fn remove(
        &self,
        match_id: &MatchId,
    ) -> Result<Arc<RwLock<MatchSession>>, GatewayError> {
        let mut map = self.sessions.write().await;
        map.remove(match_id)
            .ok_or_else(|| GatewayError::SessionNotFound(match_id.clone()))
    }

    /// Returns summaries of all open sessions ordered by match id.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let map = self.sessions.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry in map.values() {
            let session = entry.read().await;
            summaries.push(SessionSummary::from(&*session));
        }
        summaries.sort_by(|a, b| a.match_id.cmp(&b.match_id));
        summaries
    }

    /// Returns the number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::live_state::LiveMatchState;
    use crate::domain::match_record::{MatchDetails, MatchRecord, MatchStatus};

    fn make_session(id: &str) -> MatchSession {
        let record = MatchRecord {
            id: MatchId::from(id),
            tournament_id: None,
            round: 1,
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
        };
        MatchSession::new(LiveMatchState::new(record, 45, true, None))
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = SessionRegistry::new();
        let (_, inserted) = registry.insert_or_get(make_session("1")).await;
        assert!(inserted);
        assert!(registry.get(&MatchId::from("1")).await.is_ok());
    }

    #[tokio::test]
    async fn second_insert_returns_existing() {
        let registry = SessionRegistry::new();
        let _ = registry.insert_or_get(make_session("1")).await;
        let (_, inserted) = registry.insert_or_get(make_session("1")).await;
        assert!(!inserted);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn missing_session_is_an_error() {
        let registry = SessionRegistry::new();
        let result = registry.get(&MatchId::from("404")).await;
        assert!(matches!(result, Err(GatewayError::SessionNotFound(_))));
        assert!(registry.remove(&MatchId::from("404")).await.is_err());
    }

    #[tokio::test]
    async fn list_is_sorted_and_remove_shrinks() {
        let registry = SessionRegistry::new();
        let _ = registry.insert_or_get(make_session("2")).await;
        let _ = registry.insert_or_get(make_session("1")).await;

        let ids: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .map(|s| s.match_id.to_string())
            .collect();
        assert_eq!(ids, ["1", "2"]);

        assert!(registry.remove(&MatchId::from("1")).await.is_ok());
        assert_eq!(registry.len().await, 1);
        assert!(!registry.is_empty().await);
    }
}
