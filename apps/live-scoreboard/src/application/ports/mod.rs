//! Port Interfaces
//!
//! Contracts between the scoreboard core and the outside world, following
//! the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `SnapshotSink`: delivery handle for one subscriber
//! - `Clock`: source of the current time for the match clock

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::matches::Match;

// =============================================================================
// Snapshots
// =============================================================================

/// One pushed frame.
///
/// Payloads are reference counted so a single broadcast shares one copy of
/// the state across every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// All matches currently in play (global feed).
    LiveMatches(Arc<[Match]>),
    /// Full state of one match (single-match feed).
    Match(Arc<Match>),
}

impl Snapshot {
    /// Build a global-feed frame.
    #[must_use]
    pub fn live_matches(matches: Vec<Match>) -> Self {
        Self::LiveMatches(matches.into())
    }

    /// Build a single-match frame.
    #[must_use]
    pub fn single(m: Match) -> Self {
        Self::Match(Arc::new(m))
    }

    /// Feed this frame belongs to.
    #[must_use]
    pub const fn feed(&self) -> Feed {
        match self {
            Self::LiveMatches(_) => Feed::Global,
            Self::Match(_) => Feed::Match,
        }
    }
}

/// Subscription feed kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Live-match list.
    Global,
    /// One specific match.
    Match,
}

impl Feed {
    /// Get the feed name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Match => "match",
        }
    }
}

// =============================================================================
// Sink Port
// =============================================================================

/// Reasons a sink refused a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The subscriber went away; the handle should be deregistered.
    #[error("sink closed")]
    Closed,
    /// The subscriber is not keeping up; this frame was dropped.
    #[error("sink full")]
    Full,
}

impl SinkError {
    /// Get the error name (used as a metric label).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Full => "full",
        }
    }
}

/// Delivery handle for one subscriber.
///
/// `send` must never block: implementations hand the frame off and return.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotSink: Send + Sync {
    /// Push one frame to the subscriber.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Closed` once the subscriber is gone and
    /// `SinkError::Full` when the frame could not be queued.
    fn send(&self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

/// Shared sink handle as stored in the subscriber registry.
pub type SinkHandle = Arc<dyn SnapshotSink>;

// =============================================================================
// Clock Port
// =============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_snapshot_serializes_as_array() {
        let snapshot = Snapshot::live_matches(vec![Match::new("m1".to_string(), "Red", "Blue")]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["teamA"], "Red");
        assert_eq!(snapshot.feed(), Feed::Global);
    }

    #[test]
    fn single_snapshot_serializes_as_object() {
        let snapshot = Snapshot::single(Match::new("m1".to_string(), "Red", "Blue"));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["id"], "m1");
        assert_eq!(snapshot.feed(), Feed::Match);
    }

    #[test]
    fn empty_live_list_serializes_as_empty_array() {
        let json = serde_json::to_string(&Snapshot::live_matches(vec![])).unwrap();
        assert_eq!(json, "[]");
    }
}
