//! Error types for generifying refactorings.

use std::path::PathBuf;
use thiserror::Error;

use crate::generify::Slot;

/// Why a single member cannot be pulled up with generification.
///
/// These are expected, per-member outcomes. A batch operation records them
/// against the member and carries on with the remaining members.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberFailure {
    #[error("Cannot generify primitive type at {slot} of '{member}': {types}")]
    CannotGenerifyPrimitive {
        member: String,
        slot: Slot,
        types: String,
    },

    #[error("Method type variable {ty} at {slot} of '{member}' is out of scope in class headers")]
    MethodTypeVariable {
        member: String,
        slot: Slot,
        ty: String,
    },

    #[error("'{member}' is not implemented by class {class}")]
    MemberNotImplemented { member: String, class: String },

    #[error("Ambiguity in overloading for sister method '{member}' in class {class}")]
    AmbiguousOverloading { member: String, class: String },

    #[error("Pulling up '{member}' would create an ambiguous overload in {target}")]
    AmbiguousOverloadInTarget { member: String, target: String },

    #[error("Private member '{member}' cannot be pulled up as an abstract member")]
    PrivateMember { member: String },

    #[error("'{member}' must be public to be pulled up into interface {target}")]
    NotPublic { member: String, target: String },

    #[error("Members of this kind cannot be generified: {member}")]
    UnsupportedMember { member: String },
}

impl MemberFailure {
    /// Whether the member's own declaration rules it out, whatever the
    /// hierarchy below the target looks like.
    pub fn disqualifies_member(&self) -> bool {
        matches!(
            self,
            MemberFailure::PrivateMember { .. }
                | MemberFailure::NotPublic { .. }
                | MemberFailure::UnsupportedMember { .. }
        )
    }
}

/// The main error type for generification.
#[derive(Error, Debug)]
pub enum GenerifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Tree-sitter parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Member '{member}' not found in class {class}")]
    MemberNotFound { class: String, member: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Member(#[from] MemberFailure),

    /// A broken invariant in the engine itself, never a user-facing outcome.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerifyError {
    /// Whether this error only disqualifies one member from the operation.
    pub fn is_member_level(&self) -> bool {
        matches!(self, GenerifyError::Member(_))
    }

    /// Returns the member-level failure, if this is one.
    pub fn as_member_failure(&self) -> Option<&MemberFailure> {
        match self {
            GenerifyError::Member(failure) => Some(failure),
            _ => None,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        GenerifyError::Internal(message.into())
    }
}

/// A specialized Result type for generification.
pub type Result<T> = std::result::Result<T, GenerifyError>;
