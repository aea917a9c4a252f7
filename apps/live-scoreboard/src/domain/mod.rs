//! Domain Layer - Core scoreboard types and business logic.
//!
//! Match records, their state machine, the registry that owns them and the
//! bookkeeping of who is watching what. Nothing here performs I/O.

/// Match records, events and the match clock.
pub mod matches;

/// Match Registry - owner of all match records.
pub mod registry;

/// Subscriber tracking for the global and per-match feeds.
pub mod subscription;
