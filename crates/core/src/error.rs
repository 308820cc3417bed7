//! Model error taxonomy.

use thiserror::Error;

use crate::id::ObjectId;

/// Result type used across the model graph layers.
pub type ModelResult<T> = Result<T, ModelError>;

/// Structural error raised while registering, validating, or resolving a
/// model graph.
///
/// Keep this focused on deterministic, structural failures. All of them abort
/// `build()` atomically: callers never observe a partially built model set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A reference points at an id that is absent from the registry.
    #[error("unknown object: {referencing} references unregistered {missing}")]
    UnknownObject {
        referencing: ObjectId,
        missing: ObjectId,
    },

    /// The same parameter name was registered twice with differing types.
    #[error(
        "duplicate parameter '{parameter}' on {object}::{operation}: \
         registered as {existing}, re-registered as {conflicting}"
    )]
    DuplicateParameter {
        object: ObjectId,
        operation: String,
        parameter: String,
        existing: ObjectId,
        conflicting: ObjectId,
    },

    /// An id appears on both sides of an inheritance relationship, or the
    /// parent graph contains a cycle.
    #[error("inheritance conflict on {object}: {conflicting} is both ancestor and specialization")]
    InheritanceConflict {
        object: ObjectId,
        conflicting: ObjectId,
    },

    /// A still-resolving placeholder was forced, or never completed.
    #[error("deferred resolution failed for {object}: {reason}")]
    DeferredResolution { object: ObjectId, reason: String },

    /// A canonical identifier string failed to parse, or an identifier
    /// segment was malformed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl ModelError {
    pub fn unknown_object(referencing: ObjectId, missing: ObjectId) -> Self {
        Self::UnknownObject {
            referencing,
            missing,
        }
    }

    pub fn duplicate_parameter(
        object: ObjectId,
        operation: impl Into<String>,
        parameter: impl Into<String>,
        existing: ObjectId,
        conflicting: ObjectId,
    ) -> Self {
        Self::DuplicateParameter {
            object,
            operation: operation.into(),
            parameter: parameter.into(),
            existing,
            conflicting,
        }
    }

    pub fn inheritance_conflict(object: ObjectId, conflicting: ObjectId) -> Self {
        Self::InheritanceConflict {
            object,
            conflicting,
        }
    }

    pub fn deferred(object: ObjectId, reason: impl Into<String>) -> Self {
        Self::DeferredResolution {
            object,
            reason: reason.into(),
        }
    }

    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }
}
