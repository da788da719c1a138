use crate::entities::LogEvent;

/// Fan-out of accepted entries to live viewers. Must return without waiting on any consumer.
pub trait LogBroadcaster: Send + Sync {
    fn broadcast(&self, event: LogEvent);
}
