//! Broadcast Dispatcher
//!
//! Computes the current projection after every mutation and pushes it to
//! every interested sink. Delivery is isolated per sink and never fails the
//! mutation that triggered the push.
//!
//! A sink that cannot take a frame is deregistered, whether it is closed or
//! just full. Dropping the handle ends the subscriber's stream, so a lagging
//! client reconnects and starts over from a fresh initial snapshot instead of
//! sitting on stale state.

use std::sync::Arc;

use crate::application::ports::{Feed, SinkError, SinkHandle, Snapshot};
use crate::domain::registry::MatchRegistry;
use crate::domain::subscription::{SubscriberId, SubscriberRegistry, SubscriberStats};
use crate::infrastructure::metrics;

/// Outcome of pushing one frame to a set of sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sinks that accepted the frame.
    pub delivered: usize,
    /// Sinks that were full; deregistered so their stream ends.
    pub dropped: usize,
    /// Sinks found closed and deregistered.
    pub pruned: usize,
}

/// Fans snapshots out to subscribers.
pub struct BroadcastDispatcher {
    matches: Arc<MatchRegistry>,
    subscribers: SubscriberRegistry<SinkHandle>,
}

impl BroadcastDispatcher {
    /// Create a dispatcher reading from the given registry.
    #[must_use]
    pub fn new(matches: Arc<MatchRegistry>) -> Self {
        Self {
            matches,
            subscribers: SubscriberRegistry::new(),
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Push the live-match list to every global subscriber.
    pub fn notify_global_changed(&self) -> DeliveryReport {
        let targets = self.subscribers.global_handles();
        if targets.is_empty() {
            return DeliveryReport::default();
        }

        let snapshot = Snapshot::live_matches(self.matches.live());
        let (report, evicted) = deliver(&snapshot, &targets);

        for id in evicted {
            self.subscribers.remove_global(id);
        }
        self.finish(Feed::Global, report)
    }

    /// Push the full state of one match to its subscribers.
    ///
    /// Unknown ids and matches without subscribers are a no-op.
    pub fn notify_match_changed(&self, match_id: &str) -> DeliveryReport {
        let targets = self.subscribers.match_handles(match_id);
        if targets.is_empty() {
            return DeliveryReport::default();
        }

        let Ok(current) = self.matches.get(match_id) else {
            return DeliveryReport::default();
        };

        let snapshot = Snapshot::single(current);
        let (report, evicted) = deliver(&snapshot, &targets);

        for id in evicted {
            self.subscribers.remove_for_match(match_id, id);
        }
        self.finish(Feed::Match, report)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a global subscriber and send it the current live list.
    pub fn add_global(&self, id: SubscriberId, sink: SinkHandle) -> DeliveryReport {
        self.subscribers.add_global(id, Arc::clone(&sink));

        let snapshot = Snapshot::live_matches(self.matches.live());
        let (report, evicted) = deliver(&snapshot, &[(id, sink)]);

        if !evicted.is_empty() {
            self.subscribers.remove_global(id);
        }
        self.finish(Feed::Global, report)
    }

    /// Register a subscriber for one match and send it the match's current
    /// state, if the match exists.
    pub fn add_for_match(
        &self,
        match_id: &str,
        id: SubscriberId,
        sink: SinkHandle,
    ) -> DeliveryReport {
        self.subscribers.add_for_match(match_id, id, Arc::clone(&sink));

        let Ok(current) = self.matches.get(match_id) else {
            return DeliveryReport::default();
        };

        let snapshot = Snapshot::single(current);
        let (report, evicted) = deliver(&snapshot, &[(id, sink)]);

        if !evicted.is_empty() {
            self.subscribers.remove_for_match(match_id, id);
        }
        self.finish(Feed::Match, report)
    }

    /// Deregister a global subscriber.
    pub fn remove_global(&self, id: SubscriberId) {
        if self.subscribers.remove_global(id) {
            self.publish_gauges();
        }
    }

    /// Deregister a per-match subscriber.
    pub fn remove_for_match(&self, match_id: &str, id: SubscriberId) {
        if self.subscribers.remove_for_match(match_id, id) {
            self.publish_gauges();
        }
    }

    /// Deregister a subscriber from every feed.
    pub fn disconnect(&self, id: SubscriberId) {
        if self.subscribers.subscriber_disconnected(id) {
            self.publish_gauges();
        }
    }

    /// Subscriber statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriberStats {
        self.subscribers.stats()
    }

    fn finish(&self, feed: Feed, report: DeliveryReport) -> DeliveryReport {
        metrics::record_snapshots_sent(feed, report.delivered as u64);
        if report.dropped > 0 {
            metrics::record_snapshots_dropped(feed, SinkError::Full, report.dropped as u64);
        }
        if report.pruned > 0 {
            metrics::record_snapshots_dropped(feed, SinkError::Closed, report.pruned as u64);
        }
        self.publish_gauges();

        tracing::debug!(
            feed = feed.as_str(),
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "Snapshot dispatched"
        );
        report
    }

    fn publish_gauges(&self) {
        let stats = self.subscribers.stats();
        metrics::set_subscribers(Feed::Global, stats.global);
        metrics::set_subscribers(Feed::Match, stats.per_match);
    }
}

/// Send one frame to each target, isolating failures per sink.
///
/// Returns the report and the ids of sinks to deregister.
fn deliver(
    snapshot: &Snapshot,
    targets: &[(SubscriberId, SinkHandle)],
) -> (DeliveryReport, Vec<SubscriberId>) {
    let mut report = DeliveryReport::default();
    let mut evicted = Vec::new();

    for (id, sink) in targets {
        match sink.send(snapshot) {
            Ok(()) => report.delivered += 1,
            Err(SinkError::Full) => {
                tracing::warn!(
                    subscriber_id = id,
                    feed = snapshot.feed().as_str(),
                    "Subscriber lagging, deregistering"
                );
                report.dropped += 1;
                evicted.push(*id);
            }
            Err(SinkError::Closed) => {
                tracing::debug!(
                    subscriber_id = id,
                    feed = snapshot.feed().as_str(),
                    "Subscriber gone, deregistering"
                );
                report.pruned += 1;
                evicted.push(*id);
            }
        }
    }

    (report, evicted)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use parking_lot::Mutex;

    use super::*;
    use crate::application::ports::{MockSnapshotSink, SnapshotSink};

    /// Sink that records every frame it accepts.
    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Snapshot>>,
    }

    impl SnapshotSink for RecordingSink {
        fn send(&self, snapshot: &Snapshot) -> Result<(), SinkError> {
            self.frames.lock().push(snapshot.clone());
            Ok(())
        }
    }

    fn failing(error: SinkError) -> SinkHandle {
        let mut sink = MockSnapshotSink::new();
        sink.expect_send().returning(move |_| Err(error));
        Arc::new(sink)
    }

    fn setup() -> (Arc<MatchRegistry>, BroadcastDispatcher) {
        let registry = Arc::new(MatchRegistry::new());
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[test]
    fn new_global_subscriber_gets_initial_live_list() {
        let (registry, dispatcher) = setup();
        let live = registry.create("Red", "Blue");
        registry.create("Green", "Gold");
        registry
            .update(live.id(), |m| m.start(Utc::now()).map(|_| ()))
            .unwrap();

        let sink = Arc::new(RecordingSink::default());
        let report = dispatcher.add_global(1, sink.clone());

        assert_eq!(report.delivered, 1);
        let frames = sink.frames.lock();
        let Snapshot::LiveMatches(list) = &frames[0] else {
            panic!("expected live list");
        };
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), live.id());
    }

    #[test]
    fn initial_live_list_may_be_empty() {
        let (_registry, dispatcher) = setup();
        let sink = Arc::new(RecordingSink::default());

        dispatcher.add_global(1, sink.clone());

        assert_eq!(
            sink.frames.lock().as_slice(),
            &[Snapshot::live_matches(vec![])]
        );
    }

    #[test]
    fn new_match_subscriber_gets_initial_state() {
        let (registry, dispatcher) = setup();
        let created = registry.create("Red", "Blue");
        let sink = Arc::new(RecordingSink::default());

        dispatcher.add_for_match(created.id(), 1, sink.clone());

        assert_eq!(sink.frames.lock().as_slice(), &[Snapshot::single(created)]);
    }

    #[test]
    fn match_notification_reaches_only_that_match() {
        let (registry, dispatcher) = setup();
        let a = registry.create("Red", "Blue");
        let b = registry.create("Green", "Gold");
        let sink_a = Arc::new(RecordingSink::default());
        let sink_b = Arc::new(RecordingSink::default());
        dispatcher.add_for_match(a.id(), 1, sink_a.clone());
        dispatcher.add_for_match(b.id(), 2, sink_b.clone());

        let report = dispatcher.notify_match_changed(a.id());

        assert_eq!(report.delivered, 1);
        assert_eq!(sink_a.frames.lock().len(), 2);
        assert_eq!(sink_b.frames.lock().len(), 1);
    }

    #[test]
    fn closed_sink_is_pruned_and_others_still_served() {
        let (_registry, dispatcher) = setup();
        let healthy = Arc::new(RecordingSink::default());
        dispatcher.add_global(1, healthy.clone());

        // Registers, then immediately fails its initial push
        let report = dispatcher.add_global(2, failing(SinkError::Closed));
        assert_eq!(report.pruned, 1);
        assert_eq!(dispatcher.stats().global, 1);

        let report = dispatcher.notify_global_changed();
        assert_eq!(report.delivered, 1);
        assert_eq!(healthy.frames.lock().len(), 2);
    }

    #[test]
    fn full_sink_is_deregistered() {
        let (registry, dispatcher) = setup();
        let created = registry.create("Red", "Blue");
        let healthy = Arc::new(RecordingSink::default());

        let mut lagging = MockSnapshotSink::new();
        let mut seq = mockall::Sequence::new();
        lagging
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        lagging
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SinkError::Full));
        dispatcher.add_for_match(created.id(), 1, Arc::new(lagging));
        dispatcher.add_for_match(created.id(), 2, healthy.clone());

        let report = dispatcher.notify_match_changed(created.id());

        assert_eq!(
            report,
            DeliveryReport {
                delivered: 1,
                dropped: 1,
                pruned: 0,
            }
        );
        assert_eq!(dispatcher.stats().per_match, 1);
        // The lagging sink is never offered another frame
        dispatcher.notify_match_changed(created.id());
        assert_eq!(healthy.frames.lock().len(), 3);
    }

    #[test]
    fn closed_match_sink_is_pruned_on_broadcast() {
        let (registry, dispatcher) = setup();
        let created = registry.create("Red", "Blue");

        let mut sink = MockSnapshotSink::new();
        let mut seq = mockall::Sequence::new();
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SinkError::Closed));
        dispatcher.add_for_match(created.id(), 1, Arc::new(sink));

        let report = dispatcher.notify_match_changed(created.id());

        assert_eq!(report.pruned, 1);
        assert_eq!(dispatcher.stats().per_match, 0);
        // Nothing left to notify
        assert_eq!(
            dispatcher.notify_match_changed(created.id()),
            DeliveryReport::default()
        );
    }

    #[test]
    fn subscriber_for_unknown_match_gets_no_initial_push() {
        let (_registry, dispatcher) = setup();
        let mut sink = MockSnapshotSink::new();
        sink.expect_send().never();

        let report = dispatcher.add_for_match("missing", 1, Arc::new(sink));

        assert_eq!(report, DeliveryReport::default());
        assert_eq!(
            dispatcher.notify_match_changed("missing"),
            DeliveryReport::default()
        );
    }

    #[test]
    fn disconnect_clears_every_feed() {
        let (registry, dispatcher) = setup();
        let created = registry.create("Red", "Blue");
        let sink: SinkHandle = Arc::new(RecordingSink::default());
        dispatcher.add_global(1, Arc::clone(&sink));
        dispatcher.add_for_match(created.id(), 1, sink);

        dispatcher.disconnect(1);

        assert_eq!(dispatcher.stats(), SubscriberStats::default());
    }

    #[test]
    fn removal_after_prune_is_noop() {
        let (_registry, dispatcher) = setup();
        dispatcher.add_global(1, failing(SinkError::Closed));

        dispatcher.remove_global(1);
        dispatcher.remove_for_match("m1", 1);

        assert_eq!(dispatcher.stats(), SubscriberStats::default());
    }
}
