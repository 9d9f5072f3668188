//! Error types for the lifecycle engine
//!
//! Broker construction is the only fallible user code the engine runs, so
//! the hierarchy stays flat: a bad name, a single failed broker, or a batch
//! of failed brokers.

use crate::broker::BrokerError;
use dom::{DomError, NodeId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// One broker that failed while a scan or mutation batch was processed.
/// Sibling elements in the same batch are always processed regardless.
#[derive(Debug)]
pub struct BrokerFailure {
    pub element: NodeId,
    pub tag: String,
    pub source: BrokerError,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid element name {name:?}: custom element names must contain '-'")]
    InvalidElementName { name: String },

    #[error("Broker construction failed for <{tag}> (node {element}): {source}")]
    BrokerInit {
        element: NodeId,
        tag: String,
        source: BrokerError,
    },

    #[error("{} broker(s) failed during batch processing", failures.len())]
    Batch { failures: Vec<BrokerFailure> },

    #[error("Tree error: {0}")]
    Dom(#[from] DomError),
}
