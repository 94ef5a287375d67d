use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::attributes::{normalize, ConversionError};
use crate::domain::customer::{
    diff, reconstruct, resolve_identity, EventSynthesizer, ResourceUpdateEvent, SchemaError,
};
use crate::messaging::{DeliveryError, EventPublisher};
use crate::metrics::Metrics;
use crate::models::{ChangeRecord, StreamEvent};

// ============================================================================
// Change Capture Processor
// ============================================================================
//
// One invocation = one batch of change-log records:
//
//   record -> normalize (old, new) -> reconstruct (before, after)
//          -> diff claims -> synthesize events
//
// Records are handled in delivery order and the derived events of all of them
// are published together. Derivation is pure, so a failed invocation can be
// re-run as a whole and yields the same events again. The first failing
// record aborts the invocation; nothing is published in that case.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("change record {index} ({event_id}) rejected: {source}")]
    Record {
        index: usize,
        event_id: String,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl PipelineError {
    /// Metric label for the failure class
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineError::Record {
                source: RecordError::Conversion(_),
                ..
            } => "conversion",
            PipelineError::Record {
                source: RecordError::Schema(_),
                ..
            } => "schema",
            PipelineError::Delivery(_) => "delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationSummary {
    pub records_processed: usize,
    pub events_published: usize,
}

pub struct ChangeCaptureProcessor {
    synthesizer: EventSynthesizer,
    publisher: EventPublisher,
    metrics: Arc<Metrics>,
}

impl ChangeCaptureProcessor {
    pub fn new(synthesizer: EventSynthesizer, publisher: EventPublisher, metrics: Arc<Metrics>) -> Self {
        Self {
            synthesizer,
            publisher,
            metrics,
        }
    }

    /// Events implied by a single change-log record
    pub fn derive_events(&self, record: &ChangeRecord) -> Result<Vec<ResourceUpdateEvent>, RecordError> {
        let old_item = normalize(record.dynamodb.old_image.as_ref())?;
        let new_item = normalize(record.dynamodb.new_image.as_ref())?;

        let before = reconstruct(&old_item)?;
        let after = reconstruct(&new_item)?;

        let Some(identity) = resolve_identity(before.as_ref(), after.as_ref()) else {
            return Ok(Vec::new());
        };

        Ok(diff(before.as_ref(), after.as_ref())
            .iter()
            .map(|outcome| self.synthesizer.synthesize(&identity, outcome))
            .collect())
    }

    /// Events for every record of the batch, in record order
    pub fn derive_all(&self, event: &StreamEvent) -> Result<Vec<ResourceUpdateEvent>, PipelineError> {
        let mut derived = Vec::new();

        for (index, record) in event.records.iter().enumerate() {
            tracing::debug!(
                record_index = index,
                event_id = %record.event_id(),
                event_name = %record.event_name(),
                event_source = record.event_source.as_deref().unwrap_or("-"),
                "Received change record"
            );

            match self.derive_events(record) {
                Ok(events) => {
                    for event in &events {
                        tracing::debug!(
                            record_index = index,
                            action = %event.action.as_str(),
                            channel = %event.data.channel_id,
                            resource_id = %event.data.id,
                            "Derived channel claim event"
                        );
                    }
                    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
                    self.metrics.record_processed(record.event_name(), &actions);
                    derived.extend(events);
                }
                Err(source) => {
                    let error = PipelineError::Record {
                        index,
                        event_id: record.event_id().to_string(),
                        source,
                    };
                    match &error {
                        PipelineError::Record {
                            source: RecordError::Conversion(e),
                            ..
                        } => tracing::error!(
                            record_index = index,
                            event_id = %record.event_id(),
                            attribute = %e.path(),
                            error = %e,
                            "❌ Could not convert change record attribute"
                        ),
                        _ => tracing::error!(
                            record_index = index,
                            event_id = %record.event_id(),
                            error = %error,
                            "❌ Could not reconstruct customer snapshot"
                        ),
                    }
                    self.metrics.record_failure(error.reason());
                    return Err(error);
                }
            }
        }

        Ok(derived)
    }

    pub async fn handle(&self, event: &StreamEvent) -> Result<InvocationSummary, PipelineError> {
        let started = Instant::now();
        tracing::info!(records = event.records.len(), "🔄 Processing change-log batch");

        let result = self.run(event).await;
        self.metrics.record_invocation(started.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            if matches!(e, PipelineError::Delivery(_)) {
                self.metrics.record_failure(e.reason());
            }
            tracing::error!(error = %e, "Invocation failed, the whole batch must be retried");
        }
        result
    }

    async fn run(&self, event: &StreamEvent) -> Result<InvocationSummary, PipelineError> {
        let events = self.derive_all(event)?;
        self.publisher.publish(&events).await?;

        let summary = InvocationSummary {
            records_processed: event.records.len(),
            events_published: events.len(),
        };
        tracing::info!(
            records = summary.records_processed,
            events = summary.events_published,
            "Invocation complete"
        );
        Ok(summary)
    }
}
