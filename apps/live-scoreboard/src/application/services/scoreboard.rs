//! Scoreboard Service
//!
//! The single entry point for every command and query. Owns the match
//! registry and the dispatcher, serializes all writers behind one lock and
//! broadcasts after each accepted mutation.
//!
//! The writer lock is held across "mutate + dispatch" so every subscriber
//! observes a match's snapshots in the order its log grew, and a new
//! subscriber's initial snapshot is never newer than the next update it
//! receives.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::dispatcher::BroadcastDispatcher;
use crate::application::ports::{Clock, SinkHandle, SystemClock};
use crate::domain::matches::{EventRequest, Match, MatchEvent};
use crate::domain::registry::{MatchCounts, MatchRegistry};
use crate::domain::subscription::{SubscriberId, SubscriberStats};
use crate::error::{ScoreboardError, ScoreboardResult};
use crate::infrastructure::metrics;

/// Shared service handle.
pub type SharedScoreboard = Arc<ScoreboardService>;

/// Scoreboard application service.
///
/// # Example
///
/// ```rust
/// use live_scoreboard::ScoreboardService;
/// use live_scoreboard::domain::matches::{EventRequest, MatchStatus};
///
/// let service = ScoreboardService::new();
///
/// let created = service.create_match("Red", "Blue").unwrap();
/// service.start_match(created.id()).unwrap();
/// let after_goal = service
///     .record_event(created.id(), EventRequest::new("goal", Some("A"), Some("Alves")))
///     .unwrap();
///
/// assert_eq!(after_goal.score_a(), 1);
/// assert_eq!(after_goal.status(), MatchStatus::Live);
/// ```
pub struct ScoreboardService {
    matches: Arc<MatchRegistry>,
    dispatcher: BroadcastDispatcher,
    clock: Arc<dyn Clock>,
    writer: Mutex<()>,
    next_subscriber_id: AtomicU64,
}

impl Default for ScoreboardService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreboardService {
    /// Create a service using the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a service with a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let matches = Arc::new(MatchRegistry::new());
        Self {
            dispatcher: BroadcastDispatcher::new(Arc::clone(&matches)),
            matches,
            clock,
            writer: Mutex::new(()),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Create a scheduled match.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either team name is blank.
    pub fn create_match(&self, team_a: &str, team_b: &str) -> ScoreboardResult<Match> {
        let (team_a, team_b) = (team_a.trim(), team_b.trim());
        if team_a.is_empty() || team_b.is_empty() {
            return Err(rejected(ScoreboardError::invalid_input(
                "teamA and teamB are required",
            )));
        }

        let _writer = self.writer.lock();
        let created = self.matches.create(team_a, team_b);

        tracing::info!(
            match_id = created.id(),
            team_a = created.team_a(),
            team_b = created.team_b(),
            "Match created"
        );
        metrics::record_match_created();

        self.dispatcher.notify_global_changed();
        Ok(created)
    }

    /// Kick off a scheduled match.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidTransition` unless
    /// the match is scheduled.
    pub fn start_match(&self, id: &str) -> ScoreboardResult<Match> {
        let started = self.mutate(id, |m, now| m.start(now).map(|_| ()))?;

        tracing::info!(match_id = id, "Match started");
        metrics::record_transition(started.status());
        Ok(started)
    }

    /// End a live match.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidTransition` unless
    /// the match is live.
    pub fn end_match(&self, id: &str) -> ScoreboardResult<Match> {
        let ended = self.mutate(id, |m, now| m.end(now).map(|_| ()))?;

        tracing::info!(
            match_id = id,
            score_a = ended.score_a(),
            score_b = ended.score_b(),
            "Match ended"
        );
        metrics::record_transition(ended.status());
        Ok(ended)
    }

    /// Parse and record an in-play event submitted as untyped input.
    ///
    /// Input is validated before the match is touched.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEventType` or `InvalidInput` for bad input,
    /// `NotFound` for an unknown id and `InvalidTransition` unless the match
    /// is live.
    pub fn record_event(&self, id: &str, request: EventRequest) -> ScoreboardResult<Match> {
        let event = MatchEvent::try_from(request).map_err(rejected)?;
        self.record(id, &event)
    }

    /// Record a typed in-play event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidTransition` unless
    /// the match is live.
    pub fn record(&self, id: &str, event: &MatchEvent) -> ScoreboardResult<Match> {
        let updated = self.mutate(id, |m, now| m.record(event, now).map(|_| ()))?;

        if let Some(log) = updated.last_log() {
            tracing::info!(
                match_id = id,
                kind = log.kind.as_str(),
                time = %log.time,
                score_a = updated.score_a(),
                score_b = updated.score_b(),
                "Match event recorded"
            );
        }
        metrics::record_event(event.kind());
        Ok(updated)
    }

    /// Apply a transition at the current time, then broadcast to both feeds.
    ///
    /// The clock is read under the writer lock so log times never run
    /// backwards.
    fn mutate<F>(&self, id: &str, apply: F) -> ScoreboardResult<Match>
    where
        F: FnOnce(&mut Match, DateTime<Utc>) -> ScoreboardResult<()>,
    {
        let _writer = self.writer.lock();
        let now = self.clock.now();
        let updated = self
            .matches
            .update(id, |m| apply(m, now))
            .map_err(rejected)?;

        self.dispatcher.notify_global_changed();
        self.dispatcher.notify_match_changed(id);
        Ok(updated)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get one match.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn get_match(&self, id: &str) -> ScoreboardResult<Match> {
        self.matches.get(id)
    }

    /// All matches, unordered.
    #[must_use]
    pub fn list_matches(&self) -> Vec<Match> {
        self.matches.list()
    }

    /// Matches currently in play.
    #[must_use]
    pub fn live_matches(&self) -> Vec<Match> {
        self.matches.live()
    }

    /// Live display clock for one match (`"37'"`, `"90+4'"`, `"FT"`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn match_clock(&self, id: &str) -> ScoreboardResult<String> {
        let m = self.matches.get(id)?;
        Ok(m.display_clock(self.clock.now()))
    }

    /// Match totals by status.
    #[must_use]
    pub fn match_counts(&self) -> MatchCounts {
        self.matches.counts()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe a sink to the live-match list.
    ///
    /// The sink receives the current list immediately.
    pub fn subscribe_global(&self, sink: SinkHandle) -> SubscriberId {
        let id = self.next_subscriber_id();

        let _writer = self.writer.lock();
        self.dispatcher.add_global(id, sink);

        tracing::debug!(subscriber_id = id, "Global subscriber added");
        id
    }

    /// Subscribe a sink to one match.
    ///
    /// The sink receives the match's current state immediately.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn subscribe_match(&self, match_id: &str, sink: SinkHandle) -> ScoreboardResult<SubscriberId> {
        let _writer = self.writer.lock();
        if !self.matches.contains(match_id) {
            return Err(rejected(ScoreboardError::NotFound(match_id.to_string())));
        }

        let id = self.next_subscriber_id();
        self.dispatcher.add_for_match(match_id, id, sink);

        tracing::debug!(subscriber_id = id, match_id, "Match subscriber added");
        Ok(id)
    }

    /// Remove a global subscriber. Unknown ids are ignored.
    pub fn unsubscribe_global(&self, id: SubscriberId) {
        self.dispatcher.remove_global(id);
        tracing::debug!(subscriber_id = id, "Global subscriber removed");
    }

    /// Remove a per-match subscriber. Unknown ids are ignored.
    pub fn unsubscribe_match(&self, match_id: &str, id: SubscriberId) {
        self.dispatcher.remove_for_match(match_id, id);
        tracing::debug!(subscriber_id = id, match_id, "Match subscriber removed");
    }

    /// Remove a subscriber from every feed it joined.
    pub fn disconnect(&self, id: SubscriberId) {
        self.dispatcher.disconnect(id);
        tracing::debug!(subscriber_id = id, "Subscriber disconnected");
    }

    /// Subscriber statistics.
    #[must_use]
    pub fn subscriber_stats(&self) -> SubscriberStats {
        self.dispatcher.stats()
    }

    fn next_subscriber_id(&self) -> SubscriberId {
        self.next_subscriber_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Log and count a rejected command, passing the error through.
fn rejected(err: ScoreboardError) -> ScoreboardError {
    tracing::warn!(error = %err, code = %err.code(), "Command rejected");
    metrics::record_command_rejected(err.code());
    err
}

// =============================================================================
// Tests
// =============================================================================
