use crate::value::ValueKind;

/// Errors that can occur while building or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No variable with this group and name.
    #[error("variable '{group}.{name}' not found")]
    NotFound { group: String, name: String },

    /// No variable with this tag.
    #[error("unknown tag {0}")]
    UnknownTag(i64),

    /// The value's kind does not match the variable's declared kind.
    #[error("type mismatch for '{group}.{name}': expected {expected}, got {found}")]
    TypeMismatch {
        group: String,
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A float value that a 32-bit wire float cannot represent.
    #[error("value {value} for '{group}.{name}' is outside the float range")]
    OutOfRange {
        group: String,
        name: String,
        value: f64,
    },

    /// The catalog could not be read.
    #[error("failed to load catalog: {0}")]
    LoadFailed(String),

    /// The catalog content violates a registry invariant.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The catalog is not valid JSON.
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
