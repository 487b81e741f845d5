// src/broadcast/channel.rs

use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::LogEvent;

/// Default per-subscriber ring size.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Publish side of the log channel. Cheap to clone; clones share subscribers.
#[derive(Debug, Clone)]
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEvent>,
}

impl LogBroadcaster {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// Never blocks. With no subscribers the event is dropped. Returns how many
    /// subscribers the event was queued for.
    pub fn publish(&self, event: LogEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                debug!(seq = event.seq(), "no subscribers; dropping log event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> LogSubscription {
        LogSubscription {
            rx: self.sender.subscribe(),
            skipped: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receive side held by one observer.
#[derive(Debug)]
pub struct LogSubscription {
    rx: broadcast::Receiver<LogEvent>,
    skipped: u64,
}

impl LogSubscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once every `LogBroadcaster` clone has been dropped.
    /// Lag is absorbed here: missed events are counted and skipped.
    pub async fn recv(&mut self) -> Option<LogEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.skipped += n;
                    warn!(
                        skipped = n,
                        total_skipped = self.skipped,
                        "log subscriber fell behind; oldest events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total number of events this subscriber lost to lag.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn into_stream(self) -> impl Stream<Item = LogEvent> + Send + Unpin {
        Box::pin(futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|event| (event, sub))
        }))
    }
}
