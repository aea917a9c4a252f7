//! Match clock labels.
//!
//! Log entries store a coarse label computed once at recording time; the live
//! display label is recomputed on every read and distinguishes stoppage-time
//! minutes.

use chrono::{DateTime, Utc};

use super::MatchStatus;

/// Regulation length of a match in minutes.
pub const REGULATION_MINUTES: i64 = 90;

/// Label used before kick-off and for the kick-off entry.
pub const KICK_OFF_LABEL: &str = "0'";

/// Label used once the match is over.
pub const FULL_TIME_LABEL: &str = "FT";

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Whole minutes elapsed since kick-off, never negative.
fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - start).num_milliseconds() / MILLIS_PER_MINUTE).max(0)
}

/// Coarse label stored in log entries: `"0'"`, `"{m}'"`, `"90+"` or `"FT"`.
#[must_use]
pub fn log_label(status: MatchStatus, start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match (status, start) {
        (MatchStatus::Finished, _) => FULL_TIME_LABEL.to_string(),
        (MatchStatus::Scheduled, _) | (MatchStatus::Live, None) => KICK_OFF_LABEL.to_string(),
        (MatchStatus::Live, Some(start)) => {
            let minutes = elapsed_minutes(start, now);
            if minutes > REGULATION_MINUTES {
                format!("{REGULATION_MINUTES}+")
            } else {
                format!("{minutes}'")
            }
        }
    }
}

/// Live display label: like [`log_label`] but renders stoppage time as
/// `"90+{m}'"`.
#[must_use]
pub fn display_label(
    status: MatchStatus,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    match (status, start) {
        (MatchStatus::Live, Some(start)) => {
            let minutes = elapsed_minutes(start, now);
            if minutes > REGULATION_MINUTES {
                format!("{REGULATION_MINUTES}+{}'", minutes - REGULATION_MINUTES)
            } else {
                format!("{minutes}'")
            }
        }
        _ => log_label(status, start, now),
    }
}
