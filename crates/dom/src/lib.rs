//! Live document tree with batched mutation observation
//!
//! This crate models the host platform surface a custom-element runtime
//! needs: an arena-backed element tree that can be mutated while observers
//! collect batched change records, plus document-order subtree queries and
//! a diagnostic serializer.
//!
//! ## Core design
//!
//! ```text
//! Document (arena, NodeId = u32)
//!     ├── append_child / remove_child / set_attribute
//!     │       └── MutationRecord → per-subscription queues
//!     └── subtree_elements / elements_by_tag / descendant_with_attribute
//! ```
//!
//! - Nodes are never freed; ids stay valid across removal and re-insertion.
//! - Mutation records carry the siblings at one mutation point only;
//!   consumers walk subtrees themselves.
//! - Everything is single-threaded: queues are `Rc`-shared, there are no
//!   locks, and record delivery happens synchronously inside the mutating
//!   call.

pub mod document;
pub mod error;
pub mod observer;
pub mod serializer;
pub mod types;

pub use document::Document;
pub use error::{DomError, Result};
pub use observer::{
    MutationRecord, MutationSubscription, ObserverId, ObserverOptions, RecordType,
};
pub use serializer::{DomSerializer, SerializerConfig};
pub use types::{NodeData, NodeId, NodeType};
