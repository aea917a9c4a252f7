//! Channel Sink Adapter
//!
//! Implements the `SnapshotSink` port on top of a bounded tokio mpsc
//! channel. Each open stream owns the receiving half; the dispatcher holds
//! the sending half inside the subscriber registry.
//!
//! # Backpressure
//!
//! `send` uses `try_send` and never waits:
//! - Channel full: `SinkError::Full`
//! - Receiver dropped: `SinkError::Closed`
//!
//! The dispatcher deregisters the sink on either error. Once the registry
//! lets go of the sender the receiver drains what is buffered and then
//! ends.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::application::ports::{SinkError, SinkHandle, Snapshot, SnapshotSink};

/// Sink that forwards snapshots into a bounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Snapshot>,
}

impl ChannelSink {
    /// Wrap an existing sender.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<Snapshot>) -> Self {
        Self { tx }
    }

    /// Whether the receiving side is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl SnapshotSink for ChannelSink {
    fn send(&self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.tx.try_send(snapshot.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// Receiving half of a channel sink.
pub type SnapshotReceiver = mpsc::Receiver<Snapshot>;

/// Create a sink handle and its receiver with the given buffer capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero; configuration rejects that value.
#[must_use]
pub fn channel_sink(capacity: usize) -> (SinkHandle, SnapshotReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (Arc::new(ChannelSink::new(tx)), rx)
}

// =============================================================================
// Tests
// =============================================================================
