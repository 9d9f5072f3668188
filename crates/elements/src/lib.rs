//! Custom-element lifecycle runtime
//!
//! Binds broker objects to custom elements in a live, mutating tree without
//! any native custom-element machinery. Elements reach the engine through
//! three independent paths, reconciled into one idempotent state machine
//! per element:
//!
//! ```text
//! already in the tree ──► registration scan ─┐
//! mutation batches ─────► tree observer ─────┼─► attach (once) ─► ready
//! created by the host ──► creation hook ─────┘        │
//!                                                     └─► mount/unmount
//! ```
//!
//! Guarantees:
//! - one broker per physical element per lifetime, never re-created on
//!   removal and re-insertion;
//! - mount/unmount hooks fire on state transitions only and strictly
//!   alternate;
//! - the ready signal fires exactly once per element, always on a later
//!   pump, never synchronously from attachment;
//! - a failing broker factory is isolated to its element, siblings in the
//!   same batch are still processed.
//!
//! Everything is single-threaded and event-driven: the host mutates the
//! [`dom::Document`], then pumps [`LifecycleEngine::process_mutations`] and
//! [`LifecycleEngine::run_ready_callbacks`].

pub mod broker;
pub mod engine;
pub mod error;
pub mod ready;
pub mod registry;

pub use broker::{BrokerError, BrokerFactory, ElementBroker};
pub use engine::{EngineConfig, LifecycleEngine, UiRootScope};
pub use error::{BrokerFailure, LifecycleError, Result};
pub use registry::ElementRegistry;

use dom::{Document, MutationSubscription, NodeId, ObserverOptions};

/// Watch a fixed set of attributes on one element
///
/// The caller polls [`MutationSubscription::take_records`] and disconnects
/// through [`Document::disconnect`] when done; unlike the engine's own
/// subscription, these are freely disposable.
pub fn observe_attributes(
    doc: &mut Document,
    element: NodeId,
    attributes: impl IntoIterator<Item = impl Into<String>>,
) -> dom::Result<MutationSubscription> {
    doc.observe(element, ObserverOptions::attribute_filter(attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_attributes_filters_and_disconnects() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let element = doc.create_element("szn-tabs").unwrap();
        doc.append_child(body, element).unwrap();

        let subscription = observe_attributes(&mut doc, element, ["selected"]).unwrap();

        doc.set_attribute(element, "selected", "2").unwrap();
        doc.set_attribute(element, "class", "wide").unwrap();

        let records = subscription.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attribute_name.as_deref(), Some("selected"));

        doc.disconnect(subscription.id());
        doc.set_attribute(element, "selected", "3").unwrap();
        assert!(subscription.is_empty());
    }
}
