//! Broadcast channel for session events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every session
//! mutation and clock tick publishes a [`SessionEvent`] through the bus,
//! and all WebSocket connections subscribe to receive filtered events.

use tokio::sync::broadcast;

use super::{MatchId, SessionEvent};

/// Broadcast bus for [`SessionEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers and returns how many received
    /// it. Events nobody listens to are dropped.
    ///
    /// Clock ticks are logged at `trace`, everything else at `debug`.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let match_id = event.match_id().clone();
        let event_type = event.event_type_str();
        let receivers = self.sender.send(event).unwrap_or(0);
        if event_type == "clock_ticked" {
            tracing::trace!(%match_id, event_type, receivers, "session event");
        } else {
            tracing::debug!(%match_id, event_type, receivers, "session event");
        }
        receivers
    }

    /// Receiver that yields only the events of one match.
    #[must_use]
    pub fn subscribe_match(&self, match_id: MatchId) -> MatchFeed {
        MatchFeed {
            match_id,
            receiver: self.sender.subscribe(),
        }
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Per-match view of the bus.
#[derive(Debug)]
pub struct MatchFeed {
    match_id: MatchId,
    receiver: broadcast::Receiver<SessionEvent>,
}

impl MatchFeed {
    /// Waits for the next event of the followed match. Lagged events are
    /// skipped with a warning.
    ///
    /// Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.match_id() == &self.match_id => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(match_id = %self.match_id, lagged = n, "match feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next buffered event of the followed match, if any.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.match_id() == &self.match_id => return Some(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_event(id: &str) -> SessionEvent {
        SessionEvent::GoalCelebrationEnded {
            match_id: MatchId::from(id),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event("1")), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(make_event("7")), 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.match_id(), e2.match_id());
        assert_eq!(e1.match_id().as_str(), "7");
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn match_feed_skips_other_matches() {
        let bus = EventBus::new(16);
        let mut feed = bus.subscribe_match(MatchId::from("2"));

        bus.publish(make_event("1"));
        bus.publish(make_event("2"));
        bus.publish(make_event("3"));

        let Some(event) = feed.recv().await else {
            panic!("feed closed");
        };
        assert_eq!(event.match_id().as_str(), "2");
        assert!(feed.try_recv().is_none());
    }
}
