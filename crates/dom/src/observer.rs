//! Mutation observation - batched change records for the live tree
//!
//! Design: mutations are pushed synchronously into per-subscription queues
//! as they happen, in mutation order. Consumers drain whole batches with
//! [`MutationSubscription::take_records`] whenever they are pumped. This is
//! a pull-based stand-in for a browser MutationObserver callback: records
//! are coalesced between pumps, and added/removed node lists are the
//! siblings at one mutation point, never expanded recursively.
//!
//! Single-threaded by design (`Rc` queues). The tree and everything
//! observing it live on one cooperative control flow, so there are no locks.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Observer identifier, used to disconnect a subscription
pub type ObserverId = u64;

/// What a single mutation record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// Children added to / removed from the target node
    ChildList,
    /// An attribute of the target node changed
    Attributes,
}

/// One observed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRecord {
    pub record_type: RecordType,

    /// The node whose child list or attribute changed
    pub target: NodeId,

    /// Nodes inserted at this mutation point (direct children of `target`)
    pub added: SmallVec<[NodeId; 2]>,

    /// Nodes removed at this mutation point
    pub removed: SmallVec<[NodeId; 2]>,

    /// Set for [`RecordType::Attributes`] records
    pub attribute_name: Option<String>,

    /// Previous attribute value, `None` if the attribute was absent
    pub attribute_old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(
        target: NodeId,
        added: SmallVec<[NodeId; 2]>,
        removed: SmallVec<[NodeId; 2]>,
    ) -> Self {
        Self {
            record_type: RecordType::ChildList,
            target,
            added,
            removed,
            attribute_name: None,
            attribute_old_value: None,
        }
    }

    pub(crate) fn attribute(target: NodeId, name: String, old_value: Option<String>) -> Self {
        Self {
            record_type: RecordType::Attributes,
            target,
            added: SmallVec::new(),
            removed: SmallVec::new(),
            attribute_name: Some(name),
            attribute_old_value: old_value,
        }
    }
}

/// What a subscription wants to hear about
#[derive(Debug, Clone, Default)]
pub struct ObserverOptions {
    /// Deliver child insertion/removal records
    pub child_list: bool,

    /// Extend observation from the target to its whole subtree
    pub subtree: bool,

    /// Deliver attribute change records
    pub attributes: bool,

    /// Restrict attribute records to these names; `None` means all
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserverOptions {
    /// Child insertion/removal across a whole subtree, no attributes
    pub fn subtree_child_list() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Self::default()
        }
    }

    /// Filtered attribute changes on a single node
    pub fn attribute_filter(attributes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(attributes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

pub(crate) type RecordQueue = Rc<RefCell<VecDeque<MutationRecord>>>;

/// Document-side registration of one observer
#[derive(Debug)]
pub(crate) struct ObserverEntry {
    pub(crate) id: ObserverId,
    pub(crate) target: NodeId,
    pub(crate) options: ObserverOptions,
    pub(crate) queue: RecordQueue,
}

impl ObserverEntry {
    pub(crate) fn wants_attribute(&self, name: &str) -> bool {
        if !self.options.attributes {
            return false;
        }
        match &self.options.attribute_filter {
            Some(filter) => filter.iter().any(|f| f == name),
            None => true,
        }
    }
}

/// Consumer handle for one observer registration
///
/// Holds the shared record queue; the document side keeps pushing into it
/// until [`Document::disconnect`](crate::Document::disconnect) is called
/// with this subscription's id.
#[derive(Debug, Clone)]
pub struct MutationSubscription {
    id: ObserverId,
    queue: RecordQueue,
}

impl MutationSubscription {
    pub(crate) fn new(id: ObserverId, queue: RecordQueue) -> Self {
        Self { id, queue }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Drain the pending batch, in mutation order
    pub fn take_records(&self) -> Vec<MutationRecord> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Check for pending records without draining them
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_filter_matching() {
        let entry = ObserverEntry {
            id: 1,
            target: 0,
            options: ObserverOptions::attribute_filter(["disabled", "value"]),
            queue: RecordQueue::default(),
        };

        assert!(entry.wants_attribute("disabled"));
        assert!(entry.wants_attribute("value"));
        assert!(!entry.wants_attribute("class"));
    }

    #[test]
    fn test_unfiltered_attributes_match_everything() {
        let entry = ObserverEntry {
            id: 1,
            target: 0,
            options: ObserverOptions {
                attributes: true,
                ..ObserverOptions::default()
            },
            queue: RecordQueue::default(),
        };

        assert!(entry.wants_attribute("anything"));
    }

    #[test]
    fn test_take_records_drains_batch() {
        let queue = RecordQueue::default();
        let subscription = MutationSubscription::new(7, queue.clone());

        queue
            .borrow_mut()
            .push_back(MutationRecord::child_list(0, SmallVec::new(), SmallVec::new()));

        assert!(!subscription.is_empty());
        assert_eq!(subscription.take_records().len(), 1);
        assert!(subscription.is_empty());
    }
}
