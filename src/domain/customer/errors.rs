// ============================================================================
// Customer Snapshot Errors
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid URI {value:?}: {reason}")]
pub struct InvalidUri {
    pub value: String,
    pub reason: String,
}

/// A non-empty image does not satisfy the customer record layout
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("required field {0} is missing")]
    MissingField(String),

    #[error("field {field} is not a valid URI: {source}")]
    InvalidUri {
        field: String,
        #[source]
        source: InvalidUri,
    },

    #[error("channel {0} is claimed more than once")]
    DuplicateChannel(String),

    #[error("malformed customer record: {0}")]
    Malformed(#[from] serde_json::Error),
}
