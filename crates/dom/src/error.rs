//! Error types for tree operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} cannot contain children")]
    InvalidParent(NodeId),

    #[error("Inserting node {child} under {parent} would create a cycle")]
    HierarchyViolation { parent: NodeId, child: NodeId },

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),
}
