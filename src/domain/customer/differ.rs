use std::collections::{BTreeMap, BTreeSet};

use super::events::Action;
use super::value_objects::{ChannelClaim, CustomerSnapshot, Uri};

// ============================================================================
// Claim Differ
// ============================================================================
//
// Compares the channel claims of the before and after snapshots, keyed by the
// canonical channel URI. Every key lands in exactly one bucket: only-after
// (ADDED), only-before (REMOVED) or both-but-different (UPDATED). Outcomes
// are ordered by canonical key, so identical inputs always produce identical
// output.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOutcome {
    pub action: Action,
    /// The after-value for ADDED/UPDATED, the before-value for REMOVED
    pub claim: ChannelClaim,
}

/// Owner of the claims being diffed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerIdentity {
    pub customer_id: Uri,
    pub organization_id: Uri,
}

/// Identity from the after-image, or from the before-image for deletions.
pub fn resolve_identity(
    before: Option<&CustomerSnapshot>,
    after: Option<&CustomerSnapshot>,
) -> Option<CustomerIdentity> {
    after.or(before).map(|snapshot| CustomerIdentity {
        customer_id: snapshot.id.clone(),
        organization_id: snapshot.organization_id.clone(),
    })
}

pub fn diff(before: Option<&CustomerSnapshot>, after: Option<&CustomerSnapshot>) -> Vec<DiffOutcome> {
    if before.is_none() && after.is_none() {
        return Vec::new();
    }

    let before_claims = claims_by_key(before);
    let after_claims = claims_by_key(after);

    let keys: BTreeSet<&str> = before_claims
        .keys()
        .chain(after_claims.keys())
        .copied()
        .collect();

    keys.into_iter()
        .filter_map(|key| match (before_claims.get(key), after_claims.get(key)) {
            (None, Some(added)) => Some(DiffOutcome {
                action: Action::Added,
                claim: (*added).clone(),
            }),
            (Some(removed), None) => Some(DiffOutcome {
                action: Action::Removed,
                claim: (*removed).clone(),
            }),
            (Some(old), Some(new)) if old != new => Some(DiffOutcome {
                action: Action::Updated,
                claim: (*new).clone(),
            }),
            _ => None,
        })
        .collect()
}

fn claims_by_key(snapshot: Option<&CustomerSnapshot>) -> BTreeMap<&str, &ChannelClaim> {
    snapshot
        .map(|s| {
            s.channel_claims
                .iter()
                .map(|claim| (claim.channel.canonical_key(), claim))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::value_objects::{
        ChannelConstraint, ChannelPolicy, PublicationInstanceType,
    };

    fn constraint(scope: &[&str]) -> ChannelConstraint {
        ChannelConstraint {
            scope: scope.iter().map(|s| PublicationInstanceType::new(*s)).collect(),
            publishing_policy: ChannelPolicy::Everyone,
            editing_policy: ChannelPolicy::OwnerOnly,
        }
    }

    fn claim(channel: &str, scope: &[&str]) -> ChannelClaim {
        ChannelClaim {
            channel: Uri::parse(channel).unwrap(),
            constraint: constraint(scope),
        }
    }

    fn snapshot(claims: Vec<ChannelClaim>) -> CustomerSnapshot {
        CustomerSnapshot {
            id: Uri::parse("https://x/customer/1").unwrap(),
            organization_id: Uri::parse("https://x/org/1").unwrap(),
            channel_claims: claims,
        }
    }

    #[test]
    fn test_both_absent_yields_nothing() {
        assert!(diff(None, None).is_empty());
        assert!(resolve_identity(None, None).is_none());
    }

    #[test]
    fn test_identical_snapshots_yield_nothing() {
        let s = snapshot(vec![claim("https://x/pub/1", &["DEGREE_PHD"])]);
        assert!(diff(Some(&s), Some(&s.clone())).is_empty());
    }

    #[test]
    fn test_removed_claim() {
        let before = snapshot(vec![claim("https://x/pub/1", &["DEGREE_PHD"])]);
        let after = snapshot(vec![]);

        let outcomes = diff(Some(&before), Some(&after));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, Action::Removed);
        assert_eq!(outcomes[0].claim.channel.as_str(), "https://x/pub/1");
    }

    #[test]
    fn test_added_claim() {
        let before = snapshot(vec![]);
        let after = snapshot(vec![claim("https://x/pub/2", &["DEGREE_PHD"])]);

        let outcomes = diff(Some(&before), Some(&after));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, Action::Added);
        assert_eq!(outcomes[0].claim.channel.as_str(), "https://x/pub/2");
    }

    #[test]
    fn test_scope_change_is_update_with_after_value() {
        let before = snapshot(vec![claim("https://x/pub/1", &["DEGREE_PHD"])]);
        let after = snapshot(vec![claim("https://x/pub/1", &["DEGREE_PHD", "DEGREE_MASTER"])]);

        let outcomes = diff(Some(&before), Some(&after));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, Action::Updated);
        assert_eq!(outcomes[0].claim.constraint.scope.len(), 2);
    }

    #[test]
    fn test_disjoint_keys_are_all_added_or_removed() {
        let before = snapshot(vec![claim("https://x/pub/a", &[]), claim("https://x/pub/c", &[])]);
        let after = snapshot(vec![claim("https://x/pub/b", &[]), claim("https://x/pub/d", &[])]);

        let outcomes = diff(Some(&before), Some(&after));
        let summary: Vec<_> = outcomes
            .iter()
            .map(|o| (o.action, o.claim.channel.last_segment().to_string()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (Action::Removed, "a".to_string()),
                (Action::Added, "b".to_string()),
                (Action::Removed, "c".to_string()),
                (Action::Added, "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_new_record_adds_every_claim() {
        let after = snapshot(vec![claim("https://x/pub/2", &[]), claim("https://x/pub/1", &[])]);

        let outcomes = diff(None, Some(&after));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.action == Action::Added));
        assert_eq!(outcomes[0].claim.channel.as_str(), "https://x/pub/1");
    }

    #[test]
    fn test_deleted_record_removes_every_claim_and_keeps_identity() {
        let before = snapshot(vec![claim("https://x/pub/1", &[])]);

        let outcomes = diff(Some(&before), None);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, Action::Removed);

        let identity = resolve_identity(Some(&before), None).unwrap();
        assert_eq!(identity.customer_id.as_str(), "https://x/customer/1");
    }

    #[test]
    fn test_order_does_not_depend_on_claim_order() {
        let a = snapshot(vec![claim("https://x/pub/2", &[]), claim("https://x/pub/1", &[])]);
        let b = snapshot(vec![claim("https://x/pub/1", &[]), claim("https://x/pub/2", &[])]);

        assert_eq!(diff(None, Some(&a)), diff(None, Some(&b)));
    }

    #[test]
    fn test_equivalent_channel_spelling_is_not_a_change() {
        let before = snapshot(vec![claim("https://x/pub/1", &["DEGREE_PHD"])]);
        let after = snapshot(vec![claim("https://X/pub/1/", &["DEGREE_PHD"])]);

        assert!(diff(Some(&before), Some(&after)).is_empty());
    }
}
