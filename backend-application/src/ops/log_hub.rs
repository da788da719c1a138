use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use backend_domain::{LogBroadcaster, LogEvent};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::{debug, trace};

pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

/// Process-local fan-out of accepted entries to live viewers.
///
/// Each subscriber owns a bounded queue. `broadcast` only ever does a non-blocking send,
/// so a full queue loses that event for that subscriber alone.
pub struct LogHub {
    subscribers: RwLock<HashMap<u64, mpsc::Sender<LogEvent>>>,
    next_id: AtomicU64,
    buffer: usize,
    broadcast_events: AtomicU64,
    dropped_events: AtomicU64,
}

impl std::fmt::Debug for LogHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHub")
            .field("subscribers", &self.subscriber_count())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl LogHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            broadcast_events: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
        }
    }

    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Registers a new subscriber. Dropping the returned handle unsubscribes it.
    pub fn subscribe(self: &Arc<Self>) -> LogSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);
        let count = {
            let mut subscribers = self.subscribers.write();
            subscribers.insert(id, sender);
            subscribers.len()
        };
        debug!(subscriber_id = id, subscribers = count, "log stream subscriber registered");
        LogSubscription {
            id,
            receiver,
            hub: Arc::downgrade(self),
        }
    }

    /// Deregisters and closes the subscriber's queue. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            debug!(subscriber_id = id, "log stream subscriber removed");
        }
        removed
    }

    /// Returns the number of subscribers that accepted the event.
    pub fn broadcast(&self, event: &LogEvent) -> usize {
        let subscribers = self.subscribers.read();
        let mut delivered = 0;
        for (id, sender) in subscribers.iter() {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    trace!(subscriber_id = id, log_id = %event.id, "subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        self.broadcast_events.fetch_add(1, Ordering::Relaxed);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn broadcast_events(&self) -> u64 {
        self.broadcast_events.load(Ordering::Relaxed)
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

impl LogBroadcaster for LogHub {
    fn broadcast(&self, event: LogEvent) {
        LogHub::broadcast(self, &event);
    }
}

/// Receiving side of one subscription.
#[derive(Debug)]
pub struct LogSubscription {
    id: u64,
    receiver: mpsc::Receiver<LogEvent>,
    hub: Weak<LogHub>,
}

impl LogSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `None` once the hub has closed this subscription.
    pub async fn recv(&mut self) -> Option<LogEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<LogEvent, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
