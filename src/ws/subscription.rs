//! Per-connection subscription manager.
//!
//! Tracks which matches a WebSocket client follows and provides
//! server-side event filtering.

use std::collections::HashSet;

use crate::domain::MatchId;

/// Manages the set of match subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed match IDs. If `subscribe_all` is true, this set is ignored.
    match_ids: HashSet<MatchId>,
    /// Whether the client subscribes to all matches (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds match IDs to the subscription set and optionally enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[MatchId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.match_ids.extend(ids.iter().cloned());
    }

    /// Removes match IDs from the subscription set. The wildcard stays on.
    pub fn unsubscribe(&mut self, ids: &[MatchId]) {
        for id in ids {
            self.match_ids.remove(id);
        }
    }

    /// Returns `true` if events of `match_id` pass the filter.
    #[must_use]
    pub fn matches(&self, match_id: &MatchId) -> bool {
        self.subscribe_all || self.match_ids.contains(match_id)
    }

    /// Returns the number of explicitly subscribed matches.
    #[must_use]
    pub fn count(&self) -> usize {
        self.match_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub const fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
