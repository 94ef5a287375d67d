// ============================================================================
// Attributes - change-log attribute values and their normalization
// ============================================================================

pub mod errors;
pub mod normalizer;
pub mod platform;
pub mod value;

pub use errors::ConversionError;
pub use normalizer::{denormalize, normalize, to_platform};
pub use platform::{PlatformAttributeValue, PlatformImage};
pub use value::{item_to_json, AttributeValue, Item};
