//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::backend::MatchBackend;
use crate::domain::{EventBus, SessionRegistry};
use crate::service::{OfficiatingService, OfficiatingSettings, TournamentService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Officiating sessions.
    pub officiating: Arc<OfficiatingService>,
    /// Bracket views.
    pub tournaments: Arc<TournamentService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the services around one backend and one event bus.
    #[must_use]
    pub fn new(
        backend: Arc<dyn MatchBackend>,
        event_bus: EventBus,
        settings: OfficiatingSettings,
    ) -> Self {
        let officiating = OfficiatingService::new(
            Arc::clone(&backend),
            Arc::new(SessionRegistry::new()),
            event_bus.clone(),
            settings,
        );
        Self {
            officiating: Arc::new(officiating),
            tournaments: Arc::new(TournamentService::new(backend)),
            event_bus,
        }
    }
}
