//! Prometheus Metrics Module
//!
//! Exposes scoreboard metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Commands**: Matches created, state transitions, events recorded and
//!   rejected commands
//! - **Delivery**: Snapshots sent and dropped per feed
//! - **Subscribers**: Open subscriber count per feed
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before `init_metrics` is a no-op.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{Feed, SinkError};
use crate::domain::matches::{LogKind, MatchStatus};
use crate::error::ErrorCode;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Calling this again returns the already-installed handle.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed (for example when
/// another global recorder is already set).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Command counters
    describe_counter!(
        "scoreboard_matches_created_total",
        "Total matches created"
    );
    describe_counter!(
        "scoreboard_transitions_total",
        "Total match status transitions by target status"
    );
    describe_counter!(
        "scoreboard_events_recorded_total",
        "Total in-play events recorded by kind"
    );
    describe_counter!(
        "scoreboard_commands_rejected_total",
        "Total rejected commands by reason"
    );

    // Delivery counters
    describe_counter!(
        "scoreboard_snapshots_sent_total",
        "Total snapshots accepted by subscriber sinks"
    );
    describe_counter!(
        "scoreboard_snapshots_dropped_total",
        "Total snapshots not delivered, by feed and reason"
    );

    // Subscriber gauges
    describe_gauge!(
        "scoreboard_subscribers",
        "Number of open subscribers by feed"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a newly created match.
pub fn record_match_created() {
    counter!("scoreboard_matches_created_total").increment(1);
}

/// Record a status transition.
pub fn record_transition(to: MatchStatus) {
    counter!("scoreboard_transitions_total", "to" => to.as_str()).increment(1);
}

/// Record an in-play event.
pub fn record_event(kind: LogKind) {
    counter!("scoreboard_events_recorded_total", "kind" => kind.as_str()).increment(1);
}

/// Record a rejected command.
pub fn record_command_rejected(code: ErrorCode) {
    counter!("scoreboard_commands_rejected_total", "reason" => code.reason()).increment(1);
}

/// Record snapshots accepted by sinks.
pub fn record_snapshots_sent(feed: Feed, count: u64) {
    if count == 0 {
        return;
    }
    counter!("scoreboard_snapshots_sent_total", "feed" => feed.as_str()).increment(count);
}

/// Record snapshots that were not delivered.
pub fn record_snapshots_dropped(feed: Feed, reason: SinkError, count: u64) {
    counter!(
        "scoreboard_snapshots_dropped_total",
        "feed" => feed.as_str(),
        "reason" => reason.as_str()
    )
    .increment(count);
}

/// Update the open subscriber count for a feed.
#[allow(clippy::cast_precision_loss)]
pub fn set_subscribers(feed: Feed, count: usize) {
    gauge!("scoreboard_subscribers", "feed" => feed.as_str()).set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
