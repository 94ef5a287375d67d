use serde::{Deserialize, Serialize};

use crate::attributes::PlatformImage;

// ============================================================================
// Change-Log Records
// These are the notifications delivered for writes to the customer table
// ============================================================================

/// One invocation's worth of change-log records, in delivery order
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StreamEvent {
    #[serde(rename = "Records", alias = "records", default)]
    pub records: Vec<ChangeRecord>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChangeRecord {
    #[serde(rename = "eventID", alias = "eventId", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// INSERT, MODIFY or REMOVE
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,

    #[serde(rename = "eventSource", default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,

    #[serde(default)]
    pub dynamodb: StreamRecord,
}

impl ChangeRecord {
    pub fn event_id(&self) -> &str {
        self.event_id.as_deref().unwrap_or("-")
    }

    pub fn event_name(&self) -> &str {
        self.event_name.as_deref().unwrap_or("UNKNOWN")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StreamRecord {
    #[serde(rename = "keys", alias = "Keys", default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<PlatformImage>,

    #[serde(rename = "oldImage", alias = "OldImage", default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<PlatformImage>,

    #[serde(rename = "newImage", alias = "NewImage", default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<PlatformImage>,

    #[serde(
        rename = "sequenceNumber",
        alias = "SequenceNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_number: Option<String>,
}
