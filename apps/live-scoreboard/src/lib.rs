#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Live Scoreboard - Match State Machine and SSE Fan-out
//!
//! An HTTP service that keeps an in-memory registry of matches, applies
//! admin commands (create, start, record event, end) and pushes fresh
//! snapshots to every Server-Sent Events subscriber after each change.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Match state machine and registries
//!   - `matches`: Match record, transitions, event parsing, match clock
//!   - `registry`: Thread-safe match store
//!   - `subscription`: Global and per-match subscriber tracking
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Snapshot sink and clock interfaces
//!   - `services`: Scoreboard service and broadcast dispatcher
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `broadcast`: Bounded channel sinks
//!   - `http`: API routes and SSE streams
//!   - `config`: Environment configuration
//!   - `health`: Health check and metrics endpoint
//!
//! # Data Flow
//!
//! ```text
//! Admin POST ──► ScoreboardService ──► MatchRegistry
//!                      │
//!                      ▼
//!              BroadcastDispatcher ──► ChannelSink ──► SSE viewer 1
//!                                  ──► ChannelSink ──► SSE viewer 2
//!                                  ──► ChannelSink ──► SSE viewer N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Match state machine with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Error types.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::matches::{EventRequest, Log, LogKind, Match, MatchEvent, MatchId, MatchStatus, Team};
pub use domain::registry::{MatchCounts, MatchRegistry};
pub use domain::subscription::{SubscriberId, SubscriberStats};

// Errors
pub use error::{ErrorCode, ScoreboardError, ScoreboardResult};

// Application
pub use application::ports::{Clock, Feed, SinkError, SinkHandle, Snapshot, SnapshotSink, SystemClock};
pub use application::services::{ScoreboardService, SharedScoreboard};

// Infrastructure config
pub use infrastructure::config::{ConfigError, ScoreboardConfig, ServerSettings, StreamSettings};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// HTTP
pub use infrastructure::broadcast::{ChannelSink, SnapshotReceiver, channel_sink};
pub use infrastructure::http::{ApiServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
