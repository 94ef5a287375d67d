use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::event_bus::{EventBusClient, EventBusEntry, PutEventsRequest, PutEventsResponse, TransportError};
use crate::domain::customer::{ResourceUpdateEvent, DETAIL_TYPE};
use crate::metrics::Metrics;

// ============================================================================
// Event Publisher - all-or-nothing batch delivery
// ============================================================================
//
// Every derived event of an invocation goes out in as few batch requests as
// the bus allows. Any failure (transport error, unsuccessful status, or a
// single failed entry) fails the whole publish. The caller re-runs the whole
// invocation, which recomputes exactly the same events, so no per-entry retry
// state is kept here. Requests after a failed one are not sent.
//
// ============================================================================

/// Largest batch the bus accepts in one request
pub const MAX_BATCH_ENTRIES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("event bus rejected the batch with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("event bus failed {failed} of {total} entries")]
    FailedEntries { failed: usize, total: usize },
}

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub event_bus_name: String,
    pub source: String,
    pub max_batch_entries: usize,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            event_bus_name: "default".to_string(),
            source: "customer.channel-claims".to_string(),
            max_batch_entries: MAX_BATCH_ENTRIES,
        }
    }
}

pub struct EventPublisher {
    client: Arc<dyn EventBusClient>,
    settings: PublisherSettings,
    metrics: Arc<Metrics>,
}

impl EventPublisher {
    pub fn new(client: Arc<dyn EventBusClient>, settings: PublisherSettings, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            settings,
            metrics,
        }
    }

    pub fn entry_for(&self, event: &ResourceUpdateEvent) -> Result<EventBusEntry, DeliveryError> {
        Ok(EventBusEntry {
            source: self.settings.source.clone(),
            detail_type: DETAIL_TYPE.to_string(),
            detail: event.to_json()?,
            event_bus_name: self.settings.event_bus_name.clone(),
        })
    }

    pub async fn publish(&self, events: &[ResourceUpdateEvent]) -> Result<(), DeliveryError> {
        let (result, outcomes) = self.deliver(events).await;
        match &result {
            Ok(()) if events.is_empty() => debug!("No events to publish"),
            Ok(()) => info!(
                events = events.len(),
                event_bus = %self.settings.event_bus_name,
                "✅ Published channel claim events"
            ),
            Err(_) => log_entry_outcomes(events, &outcomes),
        }
        result
    }

    /// Sends every batch and returns one outcome per event, in event order
    async fn deliver(&self, events: &[ResourceUpdateEvent]) -> (Result<(), DeliveryError>, Vec<EntryOutcome>) {
        let mut outcomes = Vec::with_capacity(events.len());
        if events.is_empty() {
            return (Ok(()), outcomes);
        }

        let entries = match events.iter().map(|event| self.entry_for(event)).collect::<Result<Vec<_>, _>>() {
            Ok(entries) => entries,
            Err(e) => return (Err(e), vec![EntryOutcome::NotSent; events.len()]),
        };

        let batch_size = self.settings.max_batch_entries.clamp(1, MAX_BATCH_ENTRIES);
        for (batch, batch_entries) in entries.chunks(batch_size).enumerate() {
            match self.send_batch(batch * batch_size, batch_entries.to_vec()).await {
                Ok(response) => outcomes.extend(batch_outcomes(batch_entries.len(), Some(&response))),
                Err(failure) => {
                    outcomes.extend(batch_outcomes(batch_entries.len(), failure.response.as_ref()));
                    outcomes.resize(events.len(), EntryOutcome::NotSent);
                    return (Err(failure.error), outcomes);
                }
            }
        }

        (Ok(()), outcomes)
    }

    async fn send_batch(&self, offset: usize, entries: Vec<EventBusEntry>) -> Result<PutEventsResponse, BatchFailure> {
        let total = entries.len();
        info!(
            first_entry = offset,
            entries = total,
            event_bus = %self.settings.event_bus_name,
            "📤 Submitting batch to event bus"
        );

        let response = match self.client.put_events(&PutEventsRequest { entries }).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, first_entry = offset, entries = total, "Event bus request failed");
                self.metrics.record_publish("transport_error", 0);
                return Err(BatchFailure::without_response(e.into()));
            }
        };

        if !response.is_success_status() {
            let body = response.error_body.clone().unwrap_or_default();
            error!(
                status = response.status,
                body = %body,
                first_entry = offset,
                entries = total,
                "❌ Event bus rejected batch"
            );
            self.metrics.record_publish("rejected", 0);
            return Err(BatchFailure::without_response(DeliveryError::Rejected {
                status: response.status,
                body,
            }));
        }

        let failed = failed_entries(&response);
        if failed > 0 {
            error!(
                failed = failed,
                total = total,
                first_entry = offset,
                "❌ Event bus reported failed entries, failing the whole publish"
            );
            self.metrics.record_publish("partial_failure", failed);
            return Err(BatchFailure {
                error: DeliveryError::FailedEntries { failed, total },
                response: Some(response),
            });
        }

        self.metrics.record_publish("success", 0);
        Ok(response)
    }
}

struct BatchFailure {
    error: DeliveryError,
    /// Per-entry results, present only when the bus answered the request
    response: Option<PutEventsResponse>,
}

impl BatchFailure {
    fn without_response(error: DeliveryError) -> Self {
        Self { error, response: None }
    }
}

/// What happened to one event during a publish
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryOutcome {
    Accepted { event_id: Option<String> },
    Failed { error_code: String, error_message: String },
    /// The bus answered without a result for this entry
    NoResult,
    /// Request failed before the bus answered, or was never sent
    NotSent,
}

/// Reported count, or the number of entries carrying an error code if the
/// bus under-reports.
fn failed_entries(response: &PutEventsResponse) -> usize {
    let flagged = response.output.entries.iter().filter(|e| e.is_failed()).count();
    response.output.failed_entry_count.max(flagged)
}

fn batch_outcomes(len: usize, response: Option<&PutEventsResponse>) -> Vec<EntryOutcome> {
    let Some(response) = response else {
        return vec![EntryOutcome::NotSent; len];
    };

    (0..len)
        .map(|position| match response.output.entries.get(position) {
            Some(result) if result.is_failed() => EntryOutcome::Failed {
                error_code: result.error_code.clone().unwrap_or_default(),
                error_message: result.error_message.clone().unwrap_or_default(),
            },
            Some(result) => EntryOutcome::Accepted {
                event_id: result.event_id.clone(),
            },
            None => EntryOutcome::NoResult,
        })
        .collect()
}

fn log_entry_outcomes(events: &[ResourceUpdateEvent], outcomes: &[EntryOutcome]) {
    for (index, (event, outcome)) in events.iter().zip(outcomes).enumerate() {
        let resource_id = event.data.id.as_str();
        let action = event.action.as_str();

        match outcome {
            EntryOutcome::Failed {
                error_code,
                error_message,
            } => error!(
                index = index,
                resource_id = %resource_id,
                action = %action,
                error_code = %error_code,
                error_message = %error_message,
                "Event bus failed entry"
            ),
            EntryOutcome::Accepted { event_id } => warn!(
                index = index,
                resource_id = %resource_id,
                action = %action,
                event_id = event_id.as_deref().unwrap_or(""),
                "Entry accepted in a failed publish, it will be sent again on retry"
            ),
            EntryOutcome::NoResult => error!(
                index = index,
                resource_id = %resource_id,
                action = %action,
                "Event bus returned no result for entry"
            ),
            EntryOutcome::NotSent => warn!(
                index = index,
                resource_id = %resource_id,
                action = %action,
                "Entry not delivered"
            ),
        }
    }
}
