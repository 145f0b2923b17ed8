//! Error types for world mutation and chain construction.

use alloc::string::String;

use thiserror::Error;

use crate::body::BodyId;
use crate::constraint::ConstraintId;

/// Errors from [`World`](crate::World) lookups and mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// The id was never added, or belongs to a world generation that was cleared.
    #[error("{0} not found")]
    BodyNotFound(BodyId),

    #[error("{0} not found")]
    ConstraintNotFound(ConstraintId),

    #[error("constraint connects {0} to itself")]
    SelfConstraint(BodyId),

    #[error("invalid constraint: {reason}")]
    InvalidConstraint { reason: &'static str },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: &'static str },

    /// Pinned bodies cannot be dragged.
    #[error("{0} is pinned")]
    BodyPinned(BodyId),
}

/// Errors from building a chain topology or loading its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{name} must not be negative (got {value})")]
    NegativeCount { name: &'static str, value: i64 },

    #[error("topology needs {requested} bodies, limit is {limit}")]
    TooManyBodies { requested: usize, limit: usize },

    #[error("malformed preference {key}: {value:?}")]
    MalformedPreference { key: &'static str, value: String },

    #[error(transparent)]
    World(#[from] WorldError),
}
