//! Tournament backend access.
//!
//! [`MatchBackend`] is the seam between the officiating service and the
//! REST backend of record. [`HttpBackend`] talks to the real backend over
//! `reqwest`; tests plug in an in-memory implementation.
//!
//! The trait is object safe (methods return boxed futures) so the service
//! layer can hold an `Arc<dyn MatchBackend>`.

pub mod http;
#[cfg(test)]
pub(crate) mod memory;
pub mod requests;

use std::fmt;

use futures_util::future::BoxFuture;

use crate::domain::{MatchEvent, MatchId, MatchRecord, Tournament, TournamentId};

pub use http::HttpBackend;
pub use requests::{MatchPatch, NewMatchEvent};

/// Transport-level failures talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request could not be sent or no response arrived.
    #[error("network error for {url}: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Future returned by every [`MatchBackend`] call.
pub type BackendFuture<'a, T> = BoxFuture<'a, Result<T, BackendError>>;

/// Backend REST operations consumed by the gateway.
pub trait MatchBackend: Send + Sync + fmt::Debug {
    /// `GET /api/matches/{matchId}`.
    fn fetch_match<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, MatchRecord>;

    /// `PATCH /api/matches/{matchId}`.
    fn update_match<'a>(
        &'a self,
        match_id: &'a MatchId,
        patch: &'a MatchPatch,
    ) -> BackendFuture<'a, ()>;

    /// `POST /api/matches/{matchId}/events`.
    fn create_event<'a>(
        &'a self,
        match_id: &'a MatchId,
        event: &'a NewMatchEvent,
    ) -> BackendFuture<'a, MatchEvent>;

    /// `DELETE /api/matches/{matchId}/events/last`.
    fn delete_last_event<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, ()>;

    /// `GET /api/tournaments/{tournamentId}/matches`, all pages flattened.
    fn fetch_tournament_matches<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Vec<MatchRecord>>;

    /// `GET /api/tournaments/{tournamentId}`.
    fn fetch_tournament<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Tournament>;
}
