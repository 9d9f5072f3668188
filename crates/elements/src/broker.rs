//! Broker contract - the behavior object bound to one live element
//!
//! Design mirrors how optional lifecycle hooks behave upstream: a broker
//! that does not care about mount transitions simply keeps the default
//! no-op bodies. Absence of a hook is never an error.

use dom::{Document, NodeId};

/// Errors produced by broker constructors. The engine never interprets
/// them, it only propagates or aggregates.
pub type BrokerError = Box<dyn std::error::Error>;

/// Behavior bound to exactly one physical element
///
/// Hooks fire on mount-state transitions only and strictly alternate:
/// mount, unmount, mount, ... The broker instance survives unmount and is
/// reused when the same element re-enters the tree.
pub trait ElementBroker {
    /// The element entered the live tree
    fn on_mount(&mut self, doc: &mut Document) {
        let _ = doc;
    }

    /// The element left the live tree
    fn on_unmount(&mut self, doc: &mut Document) {
        let _ = doc;
    }
}

/// Constructs a broker for a freshly discovered element
///
/// `ui_root` is the element's designated UI sub-container (the first
/// descendant carrying the `data-<tag>-ui` attribute), when one exists at
/// attachment time.
pub trait BrokerFactory {
    fn create(
        &self,
        doc: &mut Document,
        element: NodeId,
        ui_root: Option<NodeId>,
    ) -> Result<Box<dyn ElementBroker>, BrokerError>;
}

impl<F> BrokerFactory for F
where
    F: Fn(&mut Document, NodeId, Option<NodeId>) -> Result<Box<dyn ElementBroker>, BrokerError>,
{
    fn create(
        &self,
        doc: &mut Document,
        element: NodeId,
        ui_root: Option<NodeId>,
    ) -> Result<Box<dyn ElementBroker>, BrokerError> {
        self(doc, element, ui_root)
    }
}
