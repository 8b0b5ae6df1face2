//! # Structured Error Handling
//!
//! Error types for the registry, executor, response and pagination layers.
//! Management-call failures (`RegistryError`) are surfaced synchronously to
//! the caller; dispatch-time lookup misses are an outcome, not an error
//! (see [`DispatchOutcome`](crate::registry::DispatchOutcome)).

use thiserror::Error;

/// Maximum length of a custom identifier, including the metadata portion.
pub const MAX_CUSTOM_ID_LENGTH: usize = 100;

/// Validation failures raised while building identifiers, columns or modals.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The joined custom identifier exceeds [`MAX_CUSTOM_ID_LENGTH`].
    #[error("custom ID is {length} characters long, cannot be over {MAX_CUSTOM_ID_LENGTH}")]
    IdTooLong { length: usize },

    /// The match portion of an identifier contains the `:` separator.
    #[error("match portion {value:?} contains the reserved ':' separator")]
    SeparatorInMatch { value: String },

    /// The match portion of an identifier is empty.
    #[error("match portion of a custom ID cannot be empty")]
    EmptyMatch,

    /// A column cannot fit another control within its five rows.
    #[error("cannot fit another control into the column's {max_rows} rows")]
    ColumnFull { max_rows: usize },

    /// A modal declared more fields than the platform allows.
    #[error("modal cannot hold more than {max_fields} fields")]
    TooManyFields { max_fields: usize },

    /// Two controls or fields declared the same identifier.
    #[error("duplicate identifier {custom_id:?} declared in the same executor")]
    DuplicateId { custom_id: String },

    /// `match_override` was passed for an executor with several identifiers.
    #[error("match_override requires an executor which declares exactly one custom ID")]
    AmbiguousOverride,

    /// A link string did not match the expected format.
    #[error("string doesn't match the expected {kind} link format")]
    MalformedLink { kind: &'static str },
}

/// Errors raised by registry management calls (`register`/`deregister`).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registration for the same match is already active in an
    /// overlapping scope.
    #[error("custom ID {custom_id:?} is already registered")]
    Conflict { custom_id: String },

    /// No active registration was found for the given key.
    #[error("no registration found for {key:?}")]
    NotFound { key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Response-protocol violations and failed platform calls.
///
/// Protocol violations fail fast rather than re-issuing platform calls:
/// a second initial response is rejected locally, and a deferred
/// interaction must be finalised with an edit, never a fresh create.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// An initial response (or deferral) has already been issued.
    #[error("an initial response has already been created for this interaction")]
    AlreadyResponded,

    /// The call requires an initial response which doesn't exist yet.
    #[error("no initial response exists for this interaction yet")]
    NotResponded,

    /// The underlying platform call failed.
    #[error("platform call failed: {0}")]
    Platform(#[source] anyhow::Error),
}

/// Errors surfaced by executor invocations.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The executor requested its own deregistration. Caught by dispatch,
    /// never shown to the end user.
    #[error("executor requested its own closure")]
    Closed,

    #[error(transparent)]
    Response(#[from] ResponseError),

    /// A user callback failed.
    #[error("callback failed: {0}")]
    Callback(#[from] anyhow::Error),
}

/// Errors raised by the pagination engine.
#[derive(Debug, Error)]
pub enum PaginationError {
    /// Jump-to-last was requested for a source declared unbounded.
    #[error("cannot jump to the last entry of an unbounded page source")]
    UnsupportedOperation,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigurationError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}
