//! Typed errors for descriptor resolution, modifier transforms, and
//! registry operations.

use thiserror::Error;

/// Problems in the declarative model itself, caught before any storage I/O.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("reserved field name '{0}': the identity field is implicit")]
    ReservedField(String),
    #[error("missing reference: {entity}.{field} targets unknown entity '{target}'")]
    MissingReference {
        entity: String,
        field: String,
        target: String,
    },
    #[error("invalid validation rule for {field}: {reason}")]
    InvalidRule { field: String, reason: String },
}

/// A store/load transform failure. Propagated unmodified; the registry
/// never commits a partial write after one of these.
#[derive(Error, Debug)]
pub enum ModifierError {
    #[error("key tag mismatch: stored '{found}', expected '{expected}'")]
    KeyMismatch { found: String, expected: String },
    #[error("malformed stored value: {0}")]
    Malformed(String),
    #[error("expected text input, got {0}")]
    NotText(&'static str),
    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("unknown field: {entity}.{field}")]
    UnknownField { entity: String, field: String },
    #[error("modifier failed on {field}: {source}")]
    Modifier {
        field: String,
        source: ModifierError,
    },
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}
