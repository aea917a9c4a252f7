//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with subscribers and time.

/// Port interfaces for subscriber sinks and the clock.
pub mod ports;

/// Scoreboard service and broadcast dispatcher.
pub mod services;
