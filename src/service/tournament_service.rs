//! Tournament service: loads a tournament's matches and builds its bracket.

use std::sync::Arc;

use super::bracket_builder::{BracketScope, build_bracket};
use crate::backend::MatchBackend;
use crate::domain::{Bracket, Tournament, TournamentId};
use crate::error::GatewayError;

/// Bracket together with the tournament it was built for.
#[derive(Debug, Clone)]
pub struct TournamentBracket {
    /// Tournament header.
    pub tournament: Tournament,
    /// Scope the bracket was built with.
    pub scope: BracketScope,
    /// Rounds and champion.
    pub bracket: Bracket,
}

/// Read-only access to tournament brackets.
#[derive(Debug, Clone)]
pub struct TournamentService {
    backend: Arc<dyn MatchBackend>,
}

impl TournamentService {
    /// Creates a new `TournamentService`.
    #[must_use]
    pub fn new(backend: Arc<dyn MatchBackend>) -> Self {
        Self { backend }
    }

    /// Builds the bracket of a tournament. Without an explicit scope,
    /// group+knockout tournaments only draw their knockout stage.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the tournament or its matches cannot be
    /// loaded.
    pub async fn bracket(
        &self,
        tournament_id: &TournamentId,
        scope: Option<BracketScope>,
    ) -> Result<TournamentBracket, GatewayError> {
        let tournament = self.backend.fetch_tournament(tournament_id).await?;
        let records = self.backend.fetch_tournament_matches(tournament_id).await?;
        let scope = scope.unwrap_or_else(|| BracketScope::for_format(tournament.format));
        let bracket = build_bracket(&records, scope);
        tracing::debug!(
            %tournament_id,
            matches = records.len(),
            rounds = bracket.rounds.len(),
            decided = bracket.champion.is_some(),
            "bracket built"
        );
        Ok(TournamentBracket {
            tournament,
            scope,
            bracket,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;
    use crate::backend::BackendError;
    use crate::backend::memory::InMemoryBackend;
    use crate::domain::{ParticipantId, Stage, TournamentFormat};
    use crate::test_support::{MatchBuilder, team};

    async fn hybrid_backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .put_tournament(Tournament {
                id: TournamentId::from("t1"),
                name: "Spring Cup".into(),
                format: TournamentFormat::GroupKnockout,
            })
            .await;
        let a = team("A", "Alpha");
        let b = team("B", "Bravo");
        backend
            .put_match(
                MatchBuilder::new("1", 1)
                    .teams(&a, &b)
                    .stage(Stage::Group)
                    .score(1, 1)
                    .completed()
                    .build(),
            )
            .await;
        backend
            .put_match(
                MatchBuilder::new("2", 2)
                    .teams(&b, &a)
                    .stage(Stage::Knockout)
                    .score(0, 2)
                    .completed()
                    .build(),
            )
            .await;
        backend
    }

    #[tokio::test]
    async fn hybrid_tournament_defaults_to_knockout_stage() {
        let backend = hybrid_backend().await;
        let service = TournamentService::new(backend);
        let built = assert_ok!(service.bracket(&TournamentId::from("t1"), None).await);
        assert_eq!(built.scope, BracketScope::KnockoutOnly);
        assert_eq!(built.bracket.rounds.len(), 1);
        let Some(champion) = built.bracket.champion else {
            panic!("final is decided");
        };
        assert_eq!(champion.id, Some(ParticipantId::from("A")));
    }

    #[tokio::test]
    async fn explicit_scope_overrides_format() {
        let backend = hybrid_backend().await;
        let service = TournamentService::new(backend);
        let built = assert_ok!(
            service
                .bracket(&TournamentId::from("t1"), Some(BracketScope::All))
                .await
        );
        assert_eq!(built.bracket.rounds.len(), 2);
    }

    #[tokio::test]
    async fn unknown_tournament_is_not_found() {
        let service = TournamentService::new(Arc::new(InMemoryBackend::new()));
        let result = service.bracket(&TournamentId::from("404"), None).await;
        assert!(matches!(
            result,
            Err(GatewayError::Backend(BackendError::NotFound(_)))
        ));
    }
}
