use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the change-capture pipeline
// ============================================================================
//
// Provides metrics for:
// - Change-log record processing (throughput, failures by reason)
// - Derived channel-claim events by action
// - Event-bus publish requests and rejected entries
// - Host-level invocation retries and duration
//
// Scraped via GET /metrics on the invocation server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Record Processing Metrics
    pub records_processed: IntCounterVec,
    pub records_failed: IntCounterVec,
    pub events_derived: IntCounterVec,

    // Publish Metrics
    pub publish_requests: IntCounterVec,
    pub publish_failed_entries: IntCounter,

    // Invocation Metrics
    pub invocation_duration: Histogram,
    pub invocation_retries: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let records_processed = IntCounterVec::new(
            Opts::new("cdc_records_processed_total", "Total change-log records processed"),
            &["event_name"],
        )?;
        registry.register(Box::new(records_processed.clone()))?;

        let records_failed = IntCounterVec::new(
            Opts::new("cdc_records_failed_total", "Total change-log records that failed derivation"),
            &["reason"],
        )?;
        registry.register(Box::new(records_failed.clone()))?;

        let events_derived = IntCounterVec::new(
            Opts::new("channel_claim_events_derived_total", "Total channel claim events derived"),
            &["action"],
        )?;
        registry.register(Box::new(events_derived.clone()))?;

        let publish_requests = IntCounterVec::new(
            Opts::new("event_bus_publish_requests_total", "Total event-bus batch requests"),
            &["outcome"],
        )?;
        registry.register(Box::new(publish_requests.clone()))?;

        let publish_failed_entries = IntCounter::new(
            "event_bus_failed_entries_total",
            "Total entries the event bus reported as failed",
        )?;
        registry.register(Box::new(publish_failed_entries.clone()))?;

        let invocation_duration = Histogram::with_opts(
            HistogramOpts::new("cdc_invocation_duration_seconds", "Duration of one pipeline invocation")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0]),
        )?;
        registry.register(Box::new(invocation_duration.clone()))?;

        let invocation_retries = IntCounter::new(
            "cdc_invocation_retries_total",
            "Total invocations re-run by the replay host after a failure",
        )?;
        registry.register(Box::new(invocation_retries.clone()))?;

        Ok(Self {
            registry,
            records_processed,
            records_failed,
            events_derived,
            publish_requests,
            publish_failed_entries,
            invocation_duration,
            invocation_retries,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a successfully derived record
    pub fn record_processed(&self, event_name: &str, derived: &[&str]) {
        self.records_processed.with_label_values(&[event_name]).inc();
        for action in derived {
            self.events_derived.with_label_values(&[*action]).inc();
        }
    }

    pub fn record_failure(&self, reason: &str) {
        self.records_failed.with_label_values(&[reason]).inc();
    }

    /// Helper to record one event-bus request outcome
    pub fn record_publish(&self, outcome: &str, failed_entries: usize) {
        self.publish_requests.with_label_values(&[outcome]).inc();
        self.publish_failed_entries.inc_by(failed_entries as u64);
    }

    pub fn record_invocation(&self, duration_secs: f64) {
        self.invocation_duration.observe(duration_secs);
    }

    pub fn record_retry(&self) {
        self.invocation_retries.inc();
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_processed() {
        let metrics = Metrics::new().unwrap();
        metrics.record_processed("MODIFY", &["ADDED", "REMOVED", "ADDED"]);

        let gathered = metrics.registry.gather();
        let processed = gathered.iter().find(|m| m.name() == "cdc_records_processed_total").unwrap();
        assert_eq!(processed.metric[0].counter.value, Some(1.0));

        let derived = gathered.iter().find(|m| m.name() == "channel_claim_events_derived_total").unwrap();
        assert_eq!(derived.metric.len(), 2); // Two different action labels
    }

    #[test]
    fn test_record_publish() {
        let metrics = Metrics::new().unwrap();
        metrics.record_publish("partial_failure", 2);
        metrics.record_publish("success", 0);

        let gathered = metrics.registry.gather();
        let failed = gathered.iter().find(|m| m.name() == "event_bus_failed_entries_total").unwrap();
        assert_eq!(failed.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.record_failure("conversion");

        let text = metrics.render().unwrap();
        assert!(text.contains("cdc_records_failed_total"));
    }
}
