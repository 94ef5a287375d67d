use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::errors::InvalidUri;

// ============================================================================
// Customer Value Objects
// ============================================================================

/// An absolute URI as stored on the customer record.
///
/// Keeps the stored text for output and a canonical form for comparison:
/// scheme and host lowercased, default port dropped, dot segments resolved
/// and a trailing slash on a non-root path removed. Path case is preserved.
/// Equality, ordering and hashing use the canonical form only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    raw: String,
    canonical: Url,
}

impl Uri {
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidUri> {
        let raw = raw.into();
        // Url::parse strips surrounding whitespace; the stored text goes out verbatim
        if raw.trim() != raw {
            return Err(InvalidUri {
                value: raw,
                reason: "surrounding whitespace".to_string(),
            });
        }
        let parsed = Url::parse(&raw).map_err(|e| InvalidUri {
            value: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw,
            canonical: canonicalize(parsed),
        })
    }

    pub(crate) fn from_url(url: Url) -> Self {
        Self {
            raw: url.to_string(),
            canonical: canonicalize(url),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Stable string used to match the same resource across snapshots
    pub fn canonical_key(&self) -> &str {
        self.canonical.as_str()
    }

    /// Last non-empty path segment, falling back to the host and then to the
    /// opaque path for URIs without segments.
    pub fn last_segment(&self) -> &str {
        self.canonical
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .or_else(|| self.canonical.host_str())
            .unwrap_or_else(|| self.canonical.path())
    }

    pub(crate) fn url(&self) -> &Url {
        &self.canonical
    }
}

fn canonicalize(mut url: Url) -> Url {
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    url
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for Uri {}

impl Hash for Uri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl PartialOrd for Uri {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uri {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_key().cmp(other.canonical_key())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Uri {
    type Error = InvalidUri;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uri::parse(value)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.raw
    }
}

/// Who may publish to / edit content in a claimed channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelPolicy {
    Everyone,
    OwnerOnly,
}

/// Publication instance type a constraint applies to, e.g. `DEGREE_PHD`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationInstanceType(pub String);

impl PublicationInstanceType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Field order here is the wire order of the `constraint` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConstraint {
    /// Absent and NULL both mean an empty scope
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scope: BTreeSet<PublicationInstanceType>,
    pub publishing_policy: ChannelPolicy,
    pub editing_policy: ChannelPolicy,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeSet<PublicationInstanceType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<PublicationInstanceType>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelClaim {
    pub channel: Uri,
    pub constraint: ChannelConstraint,
}

/// Customer state reconstructed from one side of a change-log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSnapshot {
    pub id: Uri,
    pub organization_id: Uri,
    pub channel_claims: Vec<ChannelClaim>,
}
