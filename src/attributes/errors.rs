// ============================================================================
// Attribute Conversion Errors
// ============================================================================

/// A platform attribute node could not be mapped to its canonical form.
///
/// `path` is the dotted location of the node inside the image, for example
/// `channelClaims[0].constraint.scope`.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("attribute {path} carries no recognized type tag")]
    MissingTag { path: String },

    #[error("attribute {path} carries several type tags: {tags:?}")]
    AmbiguousTags { path: String, tags: Vec<&'static str> },

    #[error("attribute {path} has unknown type tag {tag}")]
    UnknownTag { path: String, tag: String },

    #[error("attribute {path} holds malformed number {value:?}")]
    InvalidNumber { path: String, value: String },

    #[error("attribute {path} holds malformed base64 binary: {source}")]
    InvalidBinary {
        path: String,
        #[source]
        source: base64::DecodeError,
    },
}

impl ConversionError {
    pub fn path(&self) -> &str {
        match self {
            ConversionError::MissingTag { path }
            | ConversionError::AmbiguousTags { path, .. }
            | ConversionError::UnknownTag { path, .. }
            | ConversionError::InvalidNumber { path, .. }
            | ConversionError::InvalidBinary { path, .. } => path,
        }
    }
}
