//! Subscriber Tracking
//!
//! Tracks which subscribers want which feed.
//!
//! # Design
//!
//! The registry keeps two independent interest sets:
//! - Global subscribers, interested in the list of live matches
//! - Per-match subscribers, keyed by match id
//!
//! Subscribers disconnect asynchronously, so every removal is an idempotent
//! no-op when the handle is already gone. Empty per-match entries are
//! pruned so the map only holds matches somebody is watching.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::matches::MatchId;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a subscriber (one open stream).
pub type SubscriberId = u64;

// =============================================================================
// Subscriber Registry
// =============================================================================

/// Thread-safe registry of subscriber handles.
///
/// `H` is the delivery handle stored per subscriber; the registry only
/// clones it out for broadcast.
///
/// # Example
///
/// ```rust
/// use live_scoreboard::domain::subscription::SubscriberRegistry;
///
/// let registry = SubscriberRegistry::new();
///
/// registry.add_global(1, "viewer-1");
/// registry.add_for_match("m1", 2, "viewer-2");
///
/// assert_eq!(registry.global_handles().len(), 1);
/// assert_eq!(registry.match_handles("m1").len(), 1);
///
/// // Removing twice is harmless.
/// registry.remove_global(1);
/// registry.remove_global(1);
/// assert!(registry.global_handles().is_empty());
/// ```
pub struct SubscriberRegistry<H> {
    global: RwLock<HashMap<SubscriberId, H>>,
    per_match: RwLock<HashMap<MatchId, HashMap<SubscriberId, H>>>,
}

impl<H> Default for SubscriberRegistry<H> {
    fn default() -> Self {
        Self {
            global: RwLock::new(HashMap::new()),
            per_match: RwLock::new(HashMap::new()),
        }
    }
}

impl<H: Clone> SubscriberRegistry<H> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global subscriber.
    pub fn add_global(&self, id: SubscriberId, handle: H) {
        self.global.write().insert(id, handle);
    }

    /// Deregister a global subscriber.
    ///
    /// Returns `true` if the subscriber was registered.
    pub fn remove_global(&self, id: SubscriberId) -> bool {
        self.global.write().remove(&id).is_some()
    }

    /// Register a subscriber for one match.
    pub fn add_for_match(&self, match_id: &str, id: SubscriberId, handle: H) {
        self.per_match
            .write()
            .entry(match_id.to_string())
            .or_default()
            .insert(id, handle);
    }

    /// Deregister a subscriber from one match.
    ///
    /// Returns `true` if the subscriber was registered for that match.
    pub fn remove_for_match(&self, match_id: &str, id: SubscriberId) -> bool {
        let mut per_match = self.per_match.write();
        let Some(subscribers) = per_match.get_mut(match_id) else {
            return false;
        };

        let removed = subscribers.remove(&id).is_some();

        // Clean up empty match entry
        if subscribers.is_empty() {
            per_match.remove(match_id);
        }

        removed
    }

    /// Remove a subscriber from every interest set.
    ///
    /// Returns `true` if it was found anywhere.
    pub fn subscriber_disconnected(&self, id: SubscriberId) -> bool {
        let mut found = self.remove_global(id);

        let mut per_match = self.per_match.write();
        per_match.retain(|_, subscribers| {
            found |= subscribers.remove(&id).is_some();
            !subscribers.is_empty()
        });

        found
    }

    /// Snapshot of the global subscribers.
    #[must_use]
    pub fn global_handles(&self) -> Vec<(SubscriberId, H)> {
        self.global
            .read()
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    /// Snapshot of the subscribers for one match.
    #[must_use]
    pub fn match_handles(&self, match_id: &str) -> Vec<(SubscriberId, H)> {
        self.per_match
            .read()
            .get(match_id)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|(id, handle)| (*id, handle.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriberStats {
        let per_match = self.per_match.read();
        SubscriberStats {
            global: self.global.read().len(),
            per_match: per_match.values().map(HashMap::len).sum(),
            watched_matches: per_match.len(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Subscriber statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberStats {
    /// Global (live list) subscribers.
    pub global: usize,
    /// Per-match subscribers across all matches.
    pub per_match: usize,
    /// Matches with at least one subscriber.
    pub watched_matches: usize,
}

impl SubscriberStats {
    /// Total open subscriptions.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.global + self.per_match
    }
}

// =============================================================================
// Tests
// =============================================================================
