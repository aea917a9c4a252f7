//! Configuration Module
//!
//! Configuration loading for the scoreboard service.

mod settings;

pub use settings::{ConfigError, ScoreboardConfig, ServerSettings, StreamSettings};
