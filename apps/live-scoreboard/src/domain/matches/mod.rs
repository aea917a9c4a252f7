//! Match Records and State Machine
//!
//! Domain types for a single tracked contest and the transitions that are
//! legal on it.
//!
//! # Lifecycle
//!
//! ```text
//! scheduled ──start──► live ──end──► finished
//!                       │
//!                       └── record(goal | card | corner | foul)
//! ```
//!
//! Transitions are one-directional. Every accepted command appends exactly
//! one [`Log`] entry; entries are never edited, removed or reordered.

mod clock;
mod event;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use clock::{FULL_TIME_LABEL, KICK_OFF_LABEL, REGULATION_MINUTES, display_label, log_label};
pub use event::{EventRequest, MatchEvent};

use crate::error::{ScoreboardError, ScoreboardResult};

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a match.
pub type MatchId = String;

/// Match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Created, not yet kicked off.
    Scheduled,
    /// In play; events are accepted.
    Live,
    /// Over; no further changes.
    Finished,
}

impl MatchStatus {
    /// Get the status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Side A (`teamA`).
    A,
    /// Side B (`teamB`).
    B,
}

impl Team {
    /// Parse a side marker (`"A"` or `"B"`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything else.
    pub fn parse(s: &str) -> ScoreboardResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(ScoreboardError::invalid_input(format!(
                "team must be \"A\" or \"B\", got \"{other}\""
            ))),
        }
    }
}

/// Kind of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Goal scored.
    Goal,
    /// Yellow card shown.
    CardYellow,
    /// Red card shown.
    CardRed,
    /// Corner kick awarded.
    Corner,
    /// Foul committed.
    Foul,
    /// Kick-off.
    Start,
    /// Final whistle.
    End,
}

impl LogKind {
    /// Get the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::CardYellow => "card_yellow",
            Self::CardRed => "card_red",
            Self::Corner => "corner",
            Self::Foul => "foul",
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// One immutable entry in a match's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Match clock label frozen at recording time.
    pub time: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Human-readable description.
    pub description: String,
    /// Side involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    /// Player involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}

// =============================================================================
// Match
// =============================================================================

/// A tracked contest between two named sides.
///
/// Fields are private so the only way to change a match is through
/// [`Match::start`], [`Match::end`] and [`Match::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    id: MatchId,
    team_a: String,
    team_b: String,
    score_a: u32,
    score_b: u32,
    status: MatchStatus,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    end_time: Option<DateTime<Utc>>,
    logs: Vec<Log>,
}

impl Match {
    /// Create a scheduled match with zero scores and no history.
    #[must_use]
    pub fn new(id: MatchId, team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self {
            id,
            team_a: team_a.into(),
            team_b: team_b.into(),
            score_a: 0,
            score_b: 0,
            status: MatchStatus::Scheduled,
            start_time: None,
            end_time: None,
            logs: Vec::new(),
        }
    }

    /// Match id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name of side A.
    #[must_use]
    pub fn team_a(&self) -> &str {
        &self.team_a
    }

    /// Display name of side B.
    #[must_use]
    pub fn team_b(&self) -> &str {
        &self.team_b
    }

    /// Display name of the given side.
    #[must_use]
    pub fn team_name(&self, team: Team) -> &str {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    /// Goals scored by side A.
    #[must_use]
    pub const fn score_a(&self) -> u32 {
        self.score_a
    }

    /// Goals scored by side B.
    #[must_use]
    pub const fn score_b(&self) -> u32 {
        self.score_b
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Whether the match is in play.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }

    /// Kick-off time.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Final whistle time.
    #[must_use]
    pub const fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Ordered event history.
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Most recent log entry.
    #[must_use]
    pub fn last_log(&self) -> Option<&Log> {
        self.logs.last()
    }

    /// Coarse clock label, as stored in new log entries.
    #[must_use]
    pub fn log_clock(&self, now: DateTime<Utc>) -> String {
        log_label(self.status, self.start_time, now)
    }

    /// Fine-grained clock label for live display (`90+7'` in stoppage time).
    #[must_use]
    pub fn display_clock(&self, now: DateTime<Utc>) -> String {
        display_label(self.status, self.start_time, now)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Kick off the match.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the match is scheduled.
    pub fn start(&mut self, now: DateTime<Utc>) -> ScoreboardResult<&Log> {
        self.require(MatchStatus::Scheduled, "start")?;

        self.status = MatchStatus::Live;
        self.start_time = Some(now);
        Ok(self.append(Log {
            time: KICK_OFF_LABEL.to_string(),
            kind: LogKind::Start,
            description: "Match Started".to_string(),
            team: None,
            player: None,
        }))
    }

    /// Blow the final whistle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the match is live.
    pub fn end(&mut self, now: DateTime<Utc>) -> ScoreboardResult<&Log> {
        self.require(MatchStatus::Live, "end")?;

        self.status = MatchStatus::Finished;
        self.end_time = Some(now);
        Ok(self.append(Log {
            time: FULL_TIME_LABEL.to_string(),
            kind: LogKind::End,
            description: "Match Ended".to_string(),
            team: None,
            player: None,
        }))
    }

    /// Record an in-play event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the match is live.
    pub fn record(&mut self, event: &MatchEvent, now: DateTime<Utc>) -> ScoreboardResult<&Log> {
        self.require(MatchStatus::Live, "record event on")?;

        let time = self.log_clock(now);
        let description = event.describe(self);

        if let MatchEvent::Goal { team, .. } = event {
            match team {
                Team::A => self.score_a = self.score_a.saturating_add(1),
                Team::B => self.score_b = self.score_b.saturating_add(1),
            }
        }

        Ok(self.append(Log {
            time,
            kind: event.kind(),
            description,
            team: event.team(),
            player: event.player().map(str::to_owned),
        }))
    }

    fn require(&self, expected: MatchStatus, action: &'static str) -> ScoreboardResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ScoreboardError::InvalidTransition {
                id: self.id.clone(),
                status: self.status,
                action,
            })
        }
    }

    fn append(&mut self, log: Log) -> &Log {
        self.logs.push(log);
        &self.logs[self.logs.len() - 1]
    }
}

// =============================================================================
// Tests
// =============================================================================
