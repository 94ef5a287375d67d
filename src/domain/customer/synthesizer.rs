use reqwest::Url;

use super::differ::{CustomerIdentity, DiffOutcome};
use super::errors::InvalidUri;
use super::events::{ChannelClaimEventPayload, ResourceType, ResourceUpdateEvent};
use super::value_objects::Uri;

// ============================================================================
// Event Synthesizer
// ============================================================================

/// Turns diff outcomes into self-contained resource update events.
///
/// The claim resource id is `<namespace>/<last segment of the channel URI>`,
/// so the same logical claim always gets the same id.
#[derive(Debug, Clone)]
pub struct EventSynthesizer {
    namespace: Uri,
}

impl EventSynthesizer {
    pub fn new(claim_id_namespace: &str) -> Result<Self, InvalidUri> {
        let namespace = Uri::parse(claim_id_namespace)?;
        if namespace.url().cannot_be_a_base() {
            return Err(InvalidUri {
                value: claim_id_namespace.to_string(),
                reason: "namespace must be a hierarchical URI".to_string(),
            });
        }
        Ok(Self { namespace })
    }

    pub fn claim_resource_id(&self, channel: &Uri) -> Uri {
        let mut url: Url = self.namespace.url().clone();
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            channel.last_segment()
        );
        url.set_path(&path);
        Uri::from_url(url)
    }

    pub fn synthesize(&self, identity: &CustomerIdentity, outcome: &DiffOutcome) -> ResourceUpdateEvent {
        ResourceUpdateEvent {
            action: outcome.action,
            resource_type: ResourceType::ChannelClaim,
            data: ChannelClaimEventPayload {
                id: self.claim_resource_id(&outcome.claim.channel),
                channel_id: outcome.claim.channel.clone(),
                customer_id: identity.customer_id.clone(),
                organization_id: identity.organization_id.clone(),
                constraint: outcome.claim.constraint.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::events::Action;
    use crate::domain::customer::value_objects::{
        ChannelClaim, ChannelConstraint, ChannelPolicy, PublicationInstanceType,
    };

    fn identity() -> CustomerIdentity {
        CustomerIdentity {
            customer_id: Uri::parse("https://x/customer/1").unwrap(),
            organization_id: Uri::parse("https://x/org/1").unwrap(),
        }
    }

    fn outcome(action: Action, channel: &str) -> DiffOutcome {
        DiffOutcome {
            action,
            claim: ChannelClaim {
                channel: Uri::parse(channel).unwrap(),
                constraint: ChannelConstraint {
                    scope: [PublicationInstanceType::new("DEGREE_PHD")].into_iter().collect(),
                    publishing_policy: ChannelPolicy::Everyone,
                    editing_policy: ChannelPolicy::OwnerOnly,
                },
            },
        }
    }

    #[test]
    fn test_event_wire_format() {
        let synthesizer = EventSynthesizer::new("https://api.example.org/customer/channel-claim").unwrap();
        let event = synthesizer.synthesize(&identity(), &outcome(Action::Removed, "https://x/pub/1"));

        assert_eq!(
            event.to_json().unwrap(),
            concat!(
                r#"{"action":"REMOVED","resourceType":"ChannelClaim","data":{"#,
                r#""id":"https://api.example.org/customer/channel-claim/1","#,
                r#""channelId":"https://x/pub/1","#,
                r#""customerId":"https://x/customer/1","#,
                r#""organizationId":"https://x/org/1","#,
                r#""constraint":{"scope":["DEGREE_PHD"],"publishingPolicy":"EVERYONE","editingPolicy":"OWNER_ONLY"}}}"#
            )
        );
    }

    #[test]
    fn test_resource_id_is_stable_across_spellings() {
        let synthesizer = EventSynthesizer::new("https://api.example.org/claims/").unwrap();

        let a = synthesizer.claim_resource_id(&Uri::parse("https://x/pub/ABC-1").unwrap());
        let b = synthesizer.claim_resource_id(&Uri::parse("https://X/pub/ABC-1/").unwrap());

        assert_eq!(a.as_str(), "https://api.example.org/claims/ABC-1");
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let synthesizer = EventSynthesizer::new("https://api.example.org/claims").unwrap();
        let event = synthesizer.synthesize(&identity(), &outcome(Action::Added, "https://x/pub/2"));

        let parsed: ResourceUpdateEvent = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_opaque_namespace_is_rejected() {
        assert!(EventSynthesizer::new("urn:claims").is_err());
    }
}
