//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `ScoreboardService`: Commands, queries and subscriptions behind one
//!   writer lock
//! - `BroadcastDispatcher`: Pushes snapshots to subscriber sinks

pub mod dispatcher;
pub mod scoreboard;

pub use dispatcher::{BroadcastDispatcher, DeliveryReport};
pub use scoreboard::{ScoreboardService, SharedScoreboard};
