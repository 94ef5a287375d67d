use serde::Deserialize;
use std::collections::BTreeSet;

use crate::attributes::{item_to_json, Item};
use super::errors::SchemaError;
use super::value_objects::{ChannelClaim, ChannelConstraint, CustomerSnapshot, Uri};

// ============================================================================
// Snapshot Reconstructor
// ============================================================================
//
// Binds a canonical attribute map onto the stored customer layout and lifts
// it into a CustomerSnapshot. Attributes the pipeline does not care about are
// ignored. Required fields are checked by hand so the error names the field.
//
// ============================================================================

/// Version 1 of the stored customer layout
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecordV1 {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
    /// Absent and NULL both mean "no claims"
    #[serde(default)]
    channel_claims: Option<Vec<ChannelClaimRecordV1>>,
}

#[derive(Debug, Deserialize)]
struct ChannelClaimRecordV1 {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    constraint: Option<ChannelConstraint>,
}

/// Returns `None` for an empty image: the record did not exist on that side
/// of the change.
pub fn reconstruct(attrs: &Item) -> Result<Option<CustomerSnapshot>, SchemaError> {
    if attrs.is_empty() {
        return Ok(None);
    }

    let record: CustomerRecordV1 = serde_json::from_value(item_to_json(attrs))?;

    let id = required_uri("id", record.id)?;
    let organization_id = required_uri("organizationId", record.organization_id)?;

    let mut seen = BTreeSet::new();
    let mut channel_claims = Vec::new();
    for (index, claim) in record.channel_claims.unwrap_or_default().into_iter().enumerate() {
        let channel = required_uri(&format!("channelClaims[{index}].channel"), claim.channel)?;
        let constraint = claim
            .constraint
            .ok_or_else(|| SchemaError::MissingField(format!("channelClaims[{index}].constraint")))?;

        if !seen.insert(channel.canonical_key().to_string()) {
            return Err(SchemaError::DuplicateChannel(channel.canonical_key().to_string()));
        }

        channel_claims.push(ChannelClaim { channel, constraint });
    }

    Ok(Some(CustomerSnapshot {
        id,
        organization_id,
        channel_claims,
    }))
}

fn required_uri(field: &str, value: Option<String>) -> Result<Uri, SchemaError> {
    let raw = value.ok_or_else(|| SchemaError::MissingField(field.to_string()))?;
    Uri::parse(raw).map_err(|source| SchemaError::InvalidUri {
        field: field.to_string(),
        source,
    })
}
