//! Error types for the diff crate.

use arbor_store::ObjectKind;
use arbor_types::ObjectId;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// An object referenced during diff was not found in the store.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The object had an unexpected kind (e.g., expected tree, got blob).
    #[error("unexpected object kind for {id}: expected {expected}, got {actual}")]
    UnexpectedObjectKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Store operation or object decoding failed.
    #[error("store error: {0}")]
    Store(#[from] arbor_store::StoreError),

    /// The directory prefix passed to a diff was neither empty nor
    /// slash-terminated.
    #[error("base path {0:?} must be empty or end in '/'")]
    InvalidBase(String),

    /// A path filter could not be compiled.
    #[error("pathspec error: {0}")]
    Pathspec(#[from] PathspecError),

    /// Diff configuration was rejected.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from compiling or inspecting a pathspec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathspecError {
    /// Patterns must be non-empty, relative, and free of `..` components.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The operation needs exactly one literal path.
    #[error("unsupported pathspec magic: {0}")]
    UnsupportedMagic(String),
}

/// Errors from loading or validating a [`DiffConfig`](crate::DiffConfig).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse diff config: {0}")]
    Parse(String),

    #[error("{name} must be within 0.0..=1.0, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
