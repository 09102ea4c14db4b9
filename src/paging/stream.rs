//! Result Stream Module
//!
//! Fan-out of a filter's cumulative results to live subscribers.
//!
//! Each filter key owns one `watch` channel holding the latest merged value.
//! Subscribers read from that single slot, so they all observe the same
//! sequence; a subscriber that falls behind skips straight to the newest
//! value instead of accumulating a backlog.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Cumulative results of a filter: None until any page was fetched.
pub type MergedResults<T> = Option<Vec<T>>;

// == Result Broadcaster ==
/// Publishing side of a filter's result stream.
#[derive(Debug)]
pub struct ResultBroadcaster<T> {
    tx: watch::Sender<MergedResults<T>>,
}

impl<T> ResultBroadcaster<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Replaces the current value and wakes every subscriber.
    ///
    /// The value is stored even when nobody is subscribed, so later
    /// subscribers start from it.
    pub fn publish(&self, merged: MergedResults<T>) {
        self.tx.send_replace(merged);
    }

    pub fn subscribe(&self) -> ResultStream<T> {
        ResultStream {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> ResultBroadcaster<T> {
    pub fn current(&self) -> MergedResults<T> {
        self.tx.borrow().clone()
    }
}

impl<T> Default for ResultBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Result Stream ==
/// A live subscription to one filter's cumulative results.
///
/// The first [`next`](ResultStream::next) yields the value current at that
/// moment; each later call waits for the next publication. Dropping the
/// stream cancels the subscription.
#[derive(Debug)]
pub struct ResultStream<T> {
    rx: watch::Receiver<MergedResults<T>>,
    primed: bool,
}

impl<T: Clone> ResultStream<T> {
    /// Waits for the next emission.
    ///
    /// Returns None once the owning store is gone.
    pub async fn next(&mut self) -> Option<MergedResults<T>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    /// The most recently published value, without consuming it.
    pub fn latest(&self) -> MergedResults<T> {
        self.rx.borrow().clone()
    }

    /// Whether a value newer than the last one returned by `next` exists.
    pub fn has_pending(&self) -> bool {
        !self.primed || self.rx.has_changed().unwrap_or(false)
    }
}

impl<T: Clone + Send + Sync + 'static> ResultStream<T> {
    /// Adapts the subscription into a [`tokio_stream::Stream`] with the same
    /// emission rules.
    pub fn into_stream(self) -> WatchStream<MergedResults<T>> {
        if self.primed {
            WatchStream::from_changes(self.rx)
        } else {
            WatchStream::new(self.rx)
        }
    }
}
