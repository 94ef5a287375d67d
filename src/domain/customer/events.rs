use serde::{Deserialize, Serialize};

use super::value_objects::{ChannelConstraint, Uri};

// ============================================================================
// Customer Resource Update Events
// ============================================================================
//
// Transient messages describing a change to one resource owned by a
// customer. They are never stored; the wire form below is the event-bus
// "detail" body.
//
// ============================================================================

/// Event-bus detail type shared by every customer resource update
pub const DETAIL_TYPE: &str = "CustomerResourceUpdate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Added,
    Removed,
    Updated,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Added => "ADDED",
            Action::Removed => "REMOVED",
            Action::Updated => "UPDATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    ChannelClaim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelClaimEventPayload {
    /// Stable identifier of the claim resource, used by consumers to dedupe
    pub id: Uri,
    pub channel_id: Uri,
    pub customer_id: Uri,
    pub organization_id: Uri,
    pub constraint: ChannelConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdateEvent {
    pub action: Action,
    pub resource_type: ResourceType,
    pub data: ChannelClaimEventPayload,
}

impl ResourceUpdateEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
