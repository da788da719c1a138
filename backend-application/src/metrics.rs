use std::sync::atomic::{AtomicU64, Ordering};

use crate::ops::LogHub;

#[derive(Debug, Default)]
pub struct Metrics {
    ingest_requests: AtomicU64,
    ingest_entries: AtomicU64,
    ingest_errors: AtomicU64,
    ingest_rejections: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self, entry_count: usize) {
        self.ingest_requests.fetch_add(1, Ordering::Relaxed);
        self.ingest_entries
            .fetch_add(entry_count as u64, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.ingest_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ingest_entries(&self) -> u64 {
        self.ingest_entries.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self, hub: &LogHub) -> String {
        let requests = self.ingest_requests.load(Ordering::Relaxed);
        let entries = self.ingest_entries.load(Ordering::Relaxed);
        let errors = self.ingest_errors.load(Ordering::Relaxed);
        let rejections = self.ingest_rejections.load(Ordering::Relaxed);

        format!(
            "# TYPE gamelog_ingest_requests_total counter\n\
gamelog_ingest_requests_total {}\n\
# TYPE gamelog_ingest_entries_total counter\n\
gamelog_ingest_entries_total {}\n\
# TYPE gamelog_ingest_errors_total counter\n\
gamelog_ingest_errors_total {}\n\
# TYPE gamelog_ingest_rejections_total counter\n\
gamelog_ingest_rejections_total {}\n\
# TYPE gamelog_broadcast_events_total counter\n\
gamelog_broadcast_events_total {}\n\
# TYPE gamelog_broadcast_dropped_total counter\n\
gamelog_broadcast_dropped_total {}\n\
# TYPE gamelog_stream_subscribers gauge\n\
gamelog_stream_subscribers {}\n",
            requests,
            entries,
            errors,
            rejections,
            hub.broadcast_events(),
            hub.dropped_events(),
            hub.subscriber_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_text_reports_counters() {
        let metrics = Metrics::default();
        metrics.record_ingest(3);
        metrics.record_ingest(2);
        metrics.record_rejection();
        let text = metrics.render_prometheus(&LogHub::default());
        assert!(text.contains("gamelog_ingest_requests_total 2\n"));
        assert!(text.contains("gamelog_ingest_entries_total 5\n"));
        assert!(text.contains("gamelog_ingest_rejections_total 1\n"));
        assert!(text.contains("gamelog_stream_subscribers 0\n"));
    }
}
