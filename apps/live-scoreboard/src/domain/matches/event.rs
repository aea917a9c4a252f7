//! In-play events and their boundary parsing.

use serde::{Deserialize, Serialize};

use super::{LogKind, Match, Team};
use crate::error::{ScoreboardError, ScoreboardResult};

/// An in-play event, carrying exactly the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// Goal for `team`, scored by `player`.
    Goal {
        /// Scoring side.
        team: Team,
        /// Scorer.
        player: String,
    },
    /// Yellow card shown to `player`.
    YellowCard {
        /// Side of the booked player, if known.
        team: Option<Team>,
        /// Booked player.
        player: String,
    },
    /// Red card shown to `player`.
    RedCard {
        /// Side of the sent-off player, if known.
        team: Option<Team>,
        /// Sent-off player.
        player: String,
    },
    /// Corner kick awarded to `team`.
    Corner {
        /// Side taking the corner.
        team: Team,
    },
    /// Foul committed by `team`.
    Foul {
        /// Offending side.
        team: Team,
    },
}

impl MatchEvent {
    /// Log kind produced by this event.
    #[must_use]
    pub const fn kind(&self) -> LogKind {
        match self {
            Self::Goal { .. } => LogKind::Goal,
            Self::YellowCard { .. } => LogKind::CardYellow,
            Self::RedCard { .. } => LogKind::CardRed,
            Self::Corner { .. } => LogKind::Corner,
            Self::Foul { .. } => LogKind::Foul,
        }
    }

    /// Side involved, if any.
    #[must_use]
    pub const fn team(&self) -> Option<Team> {
        match self {
            Self::Goal { team, .. } | Self::Corner { team } | Self::Foul { team } => Some(*team),
            Self::YellowCard { team, .. } | Self::RedCard { team, .. } => *team,
        }
    }

    /// Player involved, if any.
    #[must_use]
    pub fn player(&self) -> Option<&str> {
        match self {
            Self::Goal { player, .. }
            | Self::YellowCard { player, .. }
            | Self::RedCard { player, .. } => Some(player),
            Self::Corner { .. } | Self::Foul { .. } => None,
        }
    }

    /// Human-readable description against the given match's team names.
    #[must_use]
    pub fn describe(&self, m: &Match) -> String {
        match self {
            Self::Goal { player, .. } => format!("Goal! Scored by {player}"),
            Self::YellowCard { player, .. } => format!("Yellow Card: {player}"),
            Self::RedCard { player, .. } => format!("Red Card: {player}"),
            Self::Corner { team } => format!("Corner Kick for {}", m.team_name(*team)),
            Self::Foul { team } => format!("Foul committed by {}", m.team_name(*team)),
        }
    }
}

// =============================================================================
// Boundary Parsing
// =============================================================================

/// Untyped event as submitted by the admin client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRequest {
    /// Event type name (`goal`, `card_yellow`, `card_red`, `corner`, `foul`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Side marker (`"A"` or `"B"`).
    #[serde(default)]
    pub team: Option<String>,
    /// Player display name.
    #[serde(default)]
    pub player: Option<String>,
}

impl EventRequest {
    /// Create a request from raw parts.
    #[must_use]
    pub fn new(kind: impl Into<String>, team: Option<&str>, player: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            team: team.map(str::to_owned),
            player: player.map(str::to_owned),
        }
    }

    fn team(&self) -> ScoreboardResult<Option<Team>> {
        match self.team.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Team::parse(raw).map(Some),
        }
    }

    fn required_team(&self) -> ScoreboardResult<Team> {
        self.team()?.ok_or_else(|| {
            ScoreboardError::invalid_input(format!("{} requires a team", self.kind.trim()))
        })
    }

    fn required_player(&self) -> ScoreboardResult<String> {
        match self.player.as_deref().map(str::trim) {
            Some(player) if !player.is_empty() => Ok(player.to_string()),
            _ => Err(ScoreboardError::invalid_input(format!(
                "{} requires a player",
                self.kind.trim()
            ))),
        }
    }
}

impl TryFrom<EventRequest> for MatchEvent {
    type Error = ScoreboardError;

    fn try_from(req: EventRequest) -> Result<Self, Self::Error> {
        match req.kind.trim() {
            "goal" => Ok(Self::Goal {
                team: req.required_team()?,
                player: req.required_player()?,
            }),
            "card_yellow" => Ok(Self::YellowCard {
                team: req.team()?,
                player: req.required_player()?,
            }),
            "card_red" => Ok(Self::RedCard {
                team: req.team()?,
                player: req.required_player()?,
            }),
            "corner" => Ok(Self::Corner {
                team: req.required_team()?,
            }),
            "foul" => Ok(Self::Foul {
                team: req.required_team()?,
            }),
            "" => Err(ScoreboardError::invalid_input("event type is required")),
            "start" | "end" => Err(ScoreboardError::invalid_input(format!(
                "{} is not a recordable event; use the {} operation",
                req.kind.trim(),
                req.kind.trim()
            ))),
            other => Err(ScoreboardError::UnknownEventType(other.to_string())),
        }
    }
}
