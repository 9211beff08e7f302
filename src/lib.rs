//! # knockout-gateway
//!
//! Officiating gateway for knockout tournaments.
//!
//! The gateway sits between officiating clients and a tournament backend.
//! It renders tournament brackets (two-legged aggregates, penalty
//! tie-breaks, champion) and runs live officiating sessions: a match
//! clock, phase transitions, goals and cards, penalty shootouts and an
//! undo history, synchronised to the backend in the background.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── OfficiatingService / TournamentService (service/)
//!     ├── MatchController, BracketBuilder, gating (service/)
//!     ├── EventBus, SessionRegistry (domain/)
//!     │
//!     └── Tournament backend REST client (backend/)
//! ```

pub mod api;
pub mod app_state;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

#[cfg(test)]
mod test_support;
