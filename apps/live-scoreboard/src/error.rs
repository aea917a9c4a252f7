//! Error handling for the scoreboard.
//!
//! Every rejected command maps to one `ScoreboardError` variant, and every
//! variant maps to a stable reason string and an HTTP status class.
//!
//! | Variant | Reason | HTTP |
//! |---------|--------|------|
//! | `NotFound` | `MATCH_NOT_FOUND` | 404 |
//! | `InvalidTransition` | `INVALID_TRANSITION` | 400 |
//! | `InvalidInput` | `INVALID_INPUT` | 400 |
//! | `UnknownEventType` | `UNKNOWN_EVENT_TYPE` | 400 |
//!
//! Delivery failures towards subscribers are not errors at this level; the
//! dispatcher absorbs them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::matches::{MatchId, MatchStatus};

/// Stable error codes exposed to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown match id.
    MatchNotFound,
    /// State-machine precondition violated.
    InvalidTransition,
    /// Missing or malformed request field.
    InvalidInput,
    /// Event type outside the recordable set.
    UnknownEventType,
}

impl ErrorCode {
    /// Get the reason string for this code.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MatchNotFound => "MATCH_NOT_FOUND",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::InvalidInput => "INVALID_INPUT",
            Self::UnknownEventType => "UNKNOWN_EVENT_TYPE",
        }
    }

    /// Whether the code describes a missing resource rather than a bad request.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::MatchNotFound)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors returned by scoreboard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreboardError {
    /// No match with the given id exists.
    #[error("match not found: {0}")]
    NotFound(MatchId),

    /// The match is not in a state that allows the requested action.
    #[error("cannot {action} match {id} while it is {status}")]
    InvalidTransition {
        /// Match id.
        id: MatchId,
        /// Status at the time of the request.
        status: MatchStatus,
        /// Attempted action (`start`, `end`, `record event`).
        action: &'static str,
    },

    /// Missing or malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Event type outside the recordable set.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

impl ScoreboardError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::MatchNotFound,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::UnknownEventType(_) => ErrorCode::UnknownEventType,
        }
    }
}

/// Result alias for scoreboard operations.
pub type ScoreboardResult<T> = Result<T, ScoreboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_from_variants() {
        assert_eq!(
            ScoreboardError::NotFound("m1".to_string()).code(),
            ErrorCode::MatchNotFound
        );
        assert_eq!(
            ScoreboardError::invalid_input("x").code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            ScoreboardError::UnknownEventType("penalty".to_string()).code(),
            ErrorCode::UnknownEventType
        );
    }

    #[test]
    fn transition_message_names_action_and_status() {
        let err = ScoreboardError::InvalidTransition {
            id: "m1".to_string(),
            status: MatchStatus::Finished,
            action: "start",
        };
        assert_eq!(err.to_string(), "cannot start match m1 while it is finished");
    }

    #[test]
    fn code_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::UnknownEventType).unwrap(),
            "\"UNKNOWN_EVENT_TYPE\""
        );
        assert!(ErrorCode::MatchNotFound.is_not_found());
        assert!(!ErrorCode::InvalidInput.is_not_found());
    }
}
