//! Error types for the native object model

/// Result type for native object operations
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors reported by the native side of the bridge
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// A container of one type was used where another was required
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// The object's type declares no property with this name
    #[error("Unknown property '{property}' on {type_name}")]
    UnknownProperty {
        /// Native type name of the object
        type_name: String,
        /// Requested property name
        property: String,
    },

    /// Property exists but cannot be read
    #[error("Property '{0}' is not readable")]
    NotReadable(String),

    /// Property exists but cannot be written
    #[error("Property '{0}' is not writable")]
    NotWritable(String),

    /// Data flow failure inside the native pipeline
    #[error("Flow error: {0}")]
    Flow(String),
}

impl NativeError {
    /// Build a `TypeMismatch` from two displayable type names
    pub fn mismatch(expected: impl ToString, got: impl ToString) -> Self {
        NativeError::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
