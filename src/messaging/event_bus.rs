use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Event Bus Client - batch submission of events
// ============================================================================
//
// Mirrors the PutEvents wire format: a request carries up to ten entries, the
// response reports how many of them failed and, per entry, either an event id
// or an error code/message. The client only moves bytes; deciding what counts
// as delivered is the publisher's job.
//
// ============================================================================

const TARGET_HEADER: &str = "X-Amz-Target";
const PUT_EVENTS_TARGET: &str = "AWSEvents.PutEvents";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("event bus request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event bus client unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EventBusEntry {
    pub source: String,
    pub detail_type: String,
    /// JSON-encoded event body
    pub detail: String,
    pub event_bus_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PutEventsRequest {
    pub entries: Vec<EventBusEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PutEventsResultEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PutEventsResultEntry {
    pub fn is_failed(&self) -> bool {
        self.error_code.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PutEventsOutput {
    #[serde(default)]
    pub failed_entry_count: usize,
    #[serde(default)]
    pub entries: Vec<PutEventsResultEntry>,
}

/// What came back for one batch request
#[derive(Clone, Debug, PartialEq)]
pub struct PutEventsResponse {
    pub status: u16,
    /// Parsed body for successful statuses, empty otherwise
    pub output: PutEventsOutput,
    /// Raw body for unsuccessful statuses
    pub error_body: Option<String>,
}

impl PutEventsResponse {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport to the event bus. Implementations must not retry.
#[async_trait]
pub trait EventBusClient: Send + Sync {
    async fn put_events(&self, request: &PutEventsRequest) -> Result<PutEventsResponse, TransportError>;
}

/// Event bus reached over HTTP (bus endpoint or a signing proxy in front of it)
#[derive(Debug, Clone)]
pub struct HttpEventBusClient {
    endpoint: String,
    client: Client,
}

impl HttpEventBusClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventBusClient for HttpEventBusClient {
    async fn put_events(&self, request: &PutEventsRequest) -> Result<PutEventsResponse, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            entries = request.entries.len(),
            "Sending PutEvents request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(TARGET_HEADER, PUT_EVENTS_TARGET)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let output = response.json::<PutEventsOutput>().await?;
            Ok(PutEventsResponse {
                status: status.as_u16(),
                output,
                error_body: None,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(PutEventsResponse {
                status: status.as_u16(),
                output: PutEventsOutput::default(),
                error_body: Some(body),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = PutEventsRequest {
            entries: vec![EventBusEntry {
                source: "customer.channel-claims".to_string(),
                detail_type: "CustomerResourceUpdate".to_string(),
                detail: "{}".to_string(),
                event_bus_name: "default".to_string(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "Entries": [{
                "Source": "customer.channel-claims",
                "DetailType": "CustomerResourceUpdate",
                "Detail": "{}",
                "EventBusName": "default"
            }] })
        );
    }

    #[test]
    fn test_parse_partial_failure_output() {
        let output: PutEventsOutput = serde_json::from_value(json!({
            "FailedEntryCount": 1,
            "Entries": [
                { "EventId": "a" },
                { "ErrorCode": "InternalFailure", "ErrorMessage": "try again" },
                { "EventId": "c" }
            ]
        }))
        .unwrap();

        assert_eq!(output.failed_entry_count, 1);
        assert!(!output.entries[0].is_failed());
        assert!(output.entries[1].is_failed());
    }

    #[test]
    fn test_client_builder() {
        let client = HttpEventBusClient::new("http://localhost:4566", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:4566");
    }
}
