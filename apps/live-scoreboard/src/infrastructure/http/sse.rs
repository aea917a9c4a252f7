//! Server-Sent Events streams.
//!
//! Each open stream owns the receiving half of a channel sink and a
//! subscription guard. Dropping the stream drops the guard, which
//! deregisters the subscriber.
//!
//! A stream ends when its sink is deregistered by the dispatcher or when
//! the server's shutdown token is cancelled.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures::Stream;
use futures::stream::{BoxStream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::application::ports::Snapshot;
use crate::application::services::SharedScoreboard;
use crate::domain::matches::MatchId;
use crate::domain::subscription::SubscriberId;
use crate::infrastructure::broadcast::SnapshotReceiver;

/// Deregisters a subscriber when dropped.
pub struct SubscriptionGuard {
    scoreboard: SharedScoreboard,
    id: SubscriberId,
    match_id: Option<MatchId>,
}

impl SubscriptionGuard {
    /// Guard for a live-list subscriber.
    #[must_use]
    pub const fn global(scoreboard: SharedScoreboard, id: SubscriberId) -> Self {
        Self {
            scoreboard,
            id,
            match_id: None,
        }
    }

    /// Guard for a single-match subscriber.
    #[must_use]
    pub const fn for_match(scoreboard: SharedScoreboard, match_id: MatchId, id: SubscriberId) -> Self {
        Self {
            scoreboard,
            id,
            match_id: Some(match_id),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        match &self.match_id {
            None => self.scoreboard.unsubscribe_global(self.id),
            Some(match_id) => self.scoreboard.unsubscribe_match(match_id, self.id),
        }
    }
}

/// Stream of SSE frames for one subscriber.
pub struct SnapshotStream {
    frames: BoxStream<'static, Snapshot>,
    _guard: SubscriptionGuard,
}

impl SnapshotStream {
    /// Wrap a sink receiver and its guard, ending early on `shutdown`.
    #[must_use]
    pub fn new(
        rx: SnapshotReceiver,
        guard: SubscriptionGuard,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            frames: ReceiverStream::new(rx)
                .take_until(shutdown.cancelled_owned())
                .boxed(),
            _guard: guard,
        }
    }
}

impl Stream for SnapshotStream {
    type Item = Result<Event, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut()
            .frames
            .poll_next_unpin(cx)
            .map(|frame| frame.map(|snapshot| Event::default().json_data(&snapshot)))
    }
}
