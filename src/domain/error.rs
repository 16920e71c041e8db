//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::node::NodeId;

/// Coarse error classification shared by every layer.
///
/// Callers (CLI, request layers) map these to their own status signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced node (target or declared parent) does not exist.
    NotFound,
    /// Structurally invalid input that should have been filtered earlier.
    Validation,
    /// Semantically illegal mutation: self-parenting or a cycle.
    InvalidOperation,
    /// Concurrent-write serialization failure; safe to retry.
    Conflict,
    /// Storage, configuration or other failures outside the tree rules.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Validation => "validation error",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// Domain errors represent tree rule violations.
/// These are independent of storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("node name must not be empty")]
    EmptyName,

    #[error("cannot set node as its own parent: {0}")]
    SelfParent(NodeId),

    #[error("cycle detected: {target} is a descendant of {node}")]
    CycleDetected { node: NodeId, target: NodeId },
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NodeNotFound(_) | DomainError::ParentNotFound(_) => ErrorKind::NotFound,
            DomainError::EmptyName => ErrorKind::Validation,
            DomainError::SelfParent(_) | DomainError::CycleDetected { .. } => {
                ErrorKind::InvalidOperation
            }
        }
    }
}
