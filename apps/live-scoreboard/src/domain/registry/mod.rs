//! Match Registry
//!
//! Owns every match record for the lifetime of the process. Callers only
//! ever receive cloned snapshots; the single mutation entry point is
//! [`MatchRegistry::update`], which runs a state-machine transition against
//! the stored record under the write lock.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use super::matches::{Match, MatchId, MatchStatus};
use crate::error::{ScoreboardError, ScoreboardResult};

/// In-memory store of match records keyed by id.
///
/// # Example
///
/// ```rust
/// use live_scoreboard::domain::registry::MatchRegistry;
///
/// let registry = MatchRegistry::new();
/// let created = registry.create("Red", "Blue");
///
/// let fetched = registry.get(created.id()).unwrap();
/// assert_eq!(fetched.team_a(), "Red");
/// assert!(registry.live().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: RwLock<HashMap<MatchId, Match>>,
}

impl MatchRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new scheduled match and return a snapshot of it.
    ///
    /// Team names are taken as given; validation belongs to the caller.
    pub fn create(&self, team_a: &str, team_b: &str) -> Match {
        let mut matches = self.matches.write();

        let mut id = new_match_id();
        while matches.contains_key(&id) {
            id = new_match_id();
        }

        let record = Match::new(id.clone(), team_a, team_b);
        matches.insert(id, record.clone());
        record
    }

    /// Get a snapshot of one match.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown.
    pub fn get(&self, id: &str) -> ScoreboardResult<Match> {
        self.matches
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ScoreboardError::NotFound(id.to_string()))
    }

    /// Whether a match with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.matches.read().contains_key(id)
    }

    /// Snapshots of all matches, in no particular order.
    #[must_use]
    pub fn list(&self) -> Vec<Match> {
        self.matches.read().values().cloned().collect()
    }

    /// Snapshots of the matches currently in play.
    #[must_use]
    pub fn live(&self) -> Vec<Match> {
        self.matches
            .read()
            .values()
            .filter(|m| m.is_live())
            .cloned()
            .collect()
    }

    /// Apply a transition to a stored match and return the resulting snapshot.
    ///
    /// `apply` must leave the record untouched when it fails; the
    /// transitions on [`Match`] check their preconditions before mutating.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown, or whatever `apply` returns.
    pub fn update<F>(&self, id: &str, apply: F) -> ScoreboardResult<Match>
    where
        F: FnOnce(&mut Match) -> ScoreboardResult<()>,
    {
        let mut matches = self.matches.write();
        let record = matches
            .get_mut(id)
            .ok_or_else(|| ScoreboardError::NotFound(id.to_string()))?;

        apply(record)?;
        Ok(record.clone())
    }

    /// Number of stored matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.read().len()
    }

    /// Whether the registry holds no matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.read().is_empty()
    }

    /// Per-status totals.
    #[must_use]
    pub fn counts(&self) -> MatchCounts {
        let matches = self.matches.read();
        let mut counts = MatchCounts {
            total: matches.len(),
            ..MatchCounts::default()
        };

        for m in matches.values() {
            match m.status() {
                MatchStatus::Scheduled => counts.scheduled += 1,
                MatchStatus::Live => counts.live += 1,
                MatchStatus::Finished => counts.finished += 1,
            }
        }

        counts
    }
}

fn new_match_id() -> MatchId {
    uuid::Uuid::new_v4().to_string()
}

/// Match totals by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    /// All stored matches.
    pub total: usize,
    /// Matches not yet started.
    pub scheduled: usize,
    /// Matches in play.
    pub live: usize,
    /// Matches over.
    pub finished: usize,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn create_assigns_unique_ids() {
        let registry = MatchRegistry::new();
        let a = registry.create("Red", "Blue");
        let b = registry.create("Red", "Blue");

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
        assert_eq!(a.status(), MatchStatus::Scheduled);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let registry = MatchRegistry::new();
        assert_eq!(
            registry.get("nope"),
            Err(ScoreboardError::NotFound("nope".to_string()))
        );
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn update_persists_successful_transition() {
        let registry = MatchRegistry::new();
        let id = registry.create("Red", "Blue").id().to_string();

        let updated = registry
            .update(&id, |m| m.start(Utc::now()).map(|_| ()))
            .unwrap();

        assert_eq!(updated.status(), MatchStatus::Live);
        assert_eq!(registry.get(&id).unwrap(), updated);
        assert_eq!(registry.live().len(), 1);
    }

    #[test]
    fn update_failure_leaves_record_untouched() {
        let registry = MatchRegistry::new();
        let created = registry.create("Red", "Blue");

        let result = registry.update(created.id(), |m| m.end(Utc::now()).map(|_| ()));

        assert!(matches!(
            result,
            Err(ScoreboardError::InvalidTransition { .. })
        ));
        assert_eq!(registry.get(created.id()).unwrap(), created);
    }

    #[test]
    fn update_unknown_is_not_found() {
        let registry = MatchRegistry::new();
        let result = registry.update("nope", |_| Ok(()));
        assert!(matches!(result, Err(ScoreboardError::NotFound(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn counts_by_status() {
        let registry = MatchRegistry::new();
        let live = registry.create("Red", "Blue");
        let finished = registry.create("Green", "Gold");
        registry.create("Black", "White");

        registry
            .update(live.id(), |m| m.start(Utc::now()).map(|_| ()))
            .unwrap();
        registry
            .update(finished.id(), |m| {
                m.start(Utc::now())?;
                m.end(Utc::now()).map(|_| ())
            })
            .unwrap();

        assert_eq!(
            registry.counts(),
            MatchCounts {
                total: 3,
                scheduled: 1,
                live: 1,
                finished: 1,
            }
        );
        assert_eq!(registry.list().len(), 3);
    }
}
