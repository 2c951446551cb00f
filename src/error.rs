/// Error types for sqlx-named-template
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The placeholder scanner could not be built for the configured marker
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An array length was configured for a parameter that is not used in an
    /// `IN` / `LIKE_ANY` context, or an array operation was asked of a scalar
    #[error("array parameter required: '{0}'")]
    ArrayParameterRequired(String),

    /// Array capacities must be at least one
    #[error("invalid array length {len} for '{name}': must be greater than zero")]
    InvalidArrayLength { name: String, len: usize },

    /// The marker character would collide with identifiers or positional placeholders
    #[error("invalid parameter marker {0:?}")]
    InvalidMarker(char),

    /// The field in front of `LIKE_ANY` overlaps an earlier placeholder
    #[error("invalid array context for '{0}': the field before LIKE_ANY contains a placeholder")]
    InvalidArrayContext(String),

    /// The same name is used both as a scalar and as an array
    #[error("parameter '{0}' is used both as a scalar and as an array")]
    ConflictingParameterKind(String),

    /// A name or slot key that the compiled template does not know about
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// An array value holds more elements than its placeholder capacity
    #[error("array parameter '{name}' has {len} elements but capacity is {capacity}")]
    Arity {
        name: String,
        len: usize,
        capacity: usize,
    },

    /// Placeholder was referenced but no value was supplied for it
    #[error("Placeholder '{0}' was not bound")]
    UnboundPlaceholder(String),

    /// A value of the wrong shape was supplied (array vs. scalar)
    #[error("parameter '{name}' expects {expected}")]
    ValueShape { name: String, expected: &'static str },
}

/// Result type alias for sqlx-named-template operations
pub type Result<T> = std::result::Result<T, Error>;
