// ============================================================================
// Customer Domain - channel claims derived from customer record changes
// ============================================================================
//
// - Value objects (Uri, ChannelClaim, ChannelConstraint, CustomerSnapshot)
// - Snapshot reconstruction from canonical attribute maps
// - Claim diffing between before/after snapshots
// - Resource update events and their synthesis
// - Errors (SchemaError, InvalidUri)
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod snapshot;
pub mod differ;
pub mod events;
pub mod synthesizer;

pub use value_objects::*;
pub use errors::*;
pub use snapshot::reconstruct;
pub use differ::{diff, resolve_identity, CustomerIdentity, DiffOutcome};
pub use events::*;
pub use synthesizer::EventSynthesizer;
