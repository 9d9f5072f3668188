//! Pending-ready ledger - one-time "a broker now exists" notifications
//!
//! Callbacks never run synchronously from inside attachment or from
//! `await_ready` itself: they are parked in a scheduled queue the host
//! drains on a later turn, the same way it pumps mutation batches. A waiter
//! fires exactly once, or never if its element is never attached. There is
//! no cancellation.

use ahash::AHashMap;
use dom::{Document, NodeId};
use std::collections::VecDeque;

pub type ReadyCallback = Box<dyn FnOnce(&mut Document, NodeId)>;

#[derive(Default)]
pub struct PendingReady {
    /// Waiters for elements that have no broker yet; an element may have
    /// several.
    waiting: AHashMap<NodeId, Vec<ReadyCallback>>,

    /// Callbacks whose element is ready, awaiting the next drain.
    scheduled: VecDeque<(NodeId, ReadyCallback)>,
}

impl PendingReady {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a callback until its element is resolved
    pub fn wait(&mut self, element: NodeId, callback: ReadyCallback) {
        self.waiting.entry(element).or_default().push(callback);
    }

    /// Queue a callback for an element that is already ready
    pub fn schedule(&mut self, element: NodeId, callback: ReadyCallback) {
        self.scheduled.push_back((element, callback));
    }

    /// Move every waiter for `element` to the scheduled queue, in wait order
    pub fn resolve(&mut self, element: NodeId) {
        if let Some(callbacks) = self.waiting.remove(&element) {
            for callback in callbacks {
                self.scheduled.push_back((element, callback));
            }
        }
    }

    /// Take the current scheduled batch
    pub fn drain(&mut self) -> Vec<(NodeId, ReadyCallback)> {
        self.scheduled.drain(..).collect()
    }

    pub fn has_waiters(&self, element: NodeId) -> bool {
        self.waiting.contains_key(&element)
    }

    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_resolve_moves_all_waiters_once() {
        let mut ready = PendingReady::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..2 {
            let log = log.clone();
            ready.wait(
                7,
                Box::new(move |_doc, element| log.borrow_mut().push((i, element))),
            );
        }

        ready.resolve(7);
        assert!(!ready.has_waiters(7));
        assert_eq!(ready.scheduled_len(), 2);

        // A second resolve finds nothing to move.
        ready.resolve(7);
        assert_eq!(ready.scheduled_len(), 2);

        let mut doc = Document::new();
        for (element, callback) in ready.drain() {
            callback(&mut doc, element);
        }
        assert_eq!(*log.borrow(), vec![(0, 7), (1, 7)]);
        assert_eq!(ready.scheduled_len(), 0);
    }

    #[test]
    fn test_unresolved_waiters_never_fire() {
        let mut ready = PendingReady::new();
        ready.wait(1, Box::new(|_, _| panic!("must not fire")));
        assert!(ready.drain().is_empty());
        assert!(ready.has_waiters(1));
    }
}
