//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams session events (clock ticks,
//! phase changes, goals, shootout kicks, sync failures) to clients
//! subscribed to the matches they display.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
