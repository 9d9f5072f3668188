//! Lifecycle engine - binds brokers to custom elements in a live tree
//!
//! This is the reconciliation point for the three ways an element can
//! appear: already present when its tag is registered, delivered later in a
//! mutation batch, or handed over synchronously by the creation hook.
//! Whatever the path, a physical element gets exactly one broker, and its
//! mount/unmount hooks strictly alternate.
//!
//! All state is owned by [`LifecycleEngine`]; independent engines (one per
//! test, one per document) never share anything.

use crate::broker::{BrokerFactory, ElementBroker};
use crate::error::{BrokerFailure, LifecycleError, Result};
use crate::ready::PendingReady;
use crate::registry::ElementRegistry;
use ahash::AHashMap;
use dom::{Document, MutationSubscription, NodeId, ObserverOptions, RecordType};
use std::rc::Rc;

/// How far the ui-root attribute lookup may reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiRootScope {
    /// Naive first-match query over the whole descendant subtree. Nested
    /// same-tag elements are rare and not guarded against.
    #[default]
    Subtree,

    /// The lookup does not descend into nested elements of the same tag, so
    /// an ancestor never claims a nested host's ui-root.
    NearestHost,
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub ui_root_scope: UiRootScope,
}

/// The association between one element and its broker
///
/// The broker is set at most once per element and survives unmount; only
/// the mount flag toggles.
struct ElementBinding {
    broker: Box<dyn ElementBroker>,
    mounted: bool,
}

/// The element lifecycle engine
pub struct LifecycleEngine {
    config: EngineConfig,
    registry: ElementRegistry,
    bindings: AHashMap<NodeId, ElementBinding>,
    ready: PendingReady,

    /// The single child-list subscription, created lazily on the first
    /// registration and never disconnected.
    subscription: Option<MutationSubscription>,
}

impl LifecycleEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ElementRegistry::new(),
            bindings: AHashMap::new(),
            ready: PendingReady::new(),
            subscription: None,
        }
    }

    /// Register a custom element tag with its broker factory
    ///
    /// The first effective registration creates the mutation subscription
    /// (on the content container, falling back to the document root). Every
    /// registration of a new tag rescans the live tree and attaches +
    /// mounts matching elements that have no binding yet, in document
    /// order. Duplicate tags are ignored: `Ok(false)`, no rescan.
    pub fn register_element(
        &mut self,
        doc: &mut Document,
        name: &str,
        factory: impl BrokerFactory + 'static,
    ) -> Result<bool> {
        if !self.registry.register(name, Rc::new(factory))? {
            return Ok(false);
        }
        self.ensure_observer(doc)?;
        self.scan_live_tree(doc)?;
        Ok(true)
    }

    /// Check whether a tag name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.is_registered(name)
    }

    fn ensure_observer(&mut self, doc: &mut Document) -> Result<()> {
        if self.subscription.is_none() {
            let target = doc.body().unwrap_or_else(|| doc.root());
            let subscription = doc.observe(target, ObserverOptions::subtree_child_list())?;
            tracing::debug!("[Lifecycle] Observing subtree mutations at node {}", target);
            self.subscription = Some(subscription);
        }
        Ok(())
    }

    fn scan_live_tree(&mut self, doc: &mut Document) -> Result<()> {
        let mut failures = Vec::new();
        for element in doc.connected_elements() {
            if self.is_registered_element(doc, element)? {
                self.attach_and_mount(doc, element, &mut failures)?;
            }
        }
        Self::batch_result(failures)
    }

    fn is_registered_element(&self, doc: &Document, node: NodeId) -> Result<bool> {
        Ok(match doc.get(node)?.tag_name() {
            Some(tag) => self.registry.is_registered(tag),
            None => false,
        })
    }

    /// Attach a broker to an element, exactly once per physical element
    ///
    /// No-op (`Ok(false)`) when the element already has a binding or its tag
    /// is not registered. A factory error propagates to the caller; the
    /// element stays unbound. Never calls the mount hook.
    pub fn attach(&mut self, doc: &mut Document, node: NodeId) -> Result<bool> {
        if self.bindings.contains_key(&node) {
            return Ok(false);
        }
        let data = doc.get(node)?;
        if !data.is_element() {
            return Ok(false);
        }
        let tag = data.node_name.clone();
        let Some(factory) = self.registry.factory(&tag) else {
            return Ok(false);
        };

        let ui_root = self.find_ui_root(doc, node, &tag)?;
        let broker =
            factory
                .create(doc, node, ui_root)
                .map_err(|source| LifecycleError::BrokerInit {
                    element: node,
                    tag: tag.clone(),
                    source,
                })?;

        self.bindings.insert(
            node,
            ElementBinding {
                broker,
                mounted: false,
            },
        );
        self.ready.resolve(node);
        tracing::debug!("[Lifecycle] Attached broker to <{}> (node {})", tag, node);
        Ok(true)
    }

    fn find_ui_root(&self, doc: &Document, host: NodeId, tag: &str) -> Result<Option<NodeId>> {
        let attribute = format!("data-{}-ui", tag);
        match self.config.ui_root_scope {
            UiRootScope::Subtree => Ok(doc.descendant_with_attribute(host, &attribute)?),
            UiRootScope::NearestHost => {
                let mut stack: Vec<NodeId> = doc.children(host)?.iter().rev().copied().collect();
                while let Some(node_id) = stack.pop() {
                    let node = doc.get(node_id)?;
                    if node.has_tag(tag) {
                        // A nested same-tag host owns its own subtree.
                        continue;
                    }
                    if node.is_element() && node.attr(&attribute).is_some() {
                        return Ok(Some(node_id));
                    }
                    for &child in node.children_ids.iter().rev() {
                        stack.push(child);
                    }
                }
                Ok(None)
            }
        }
    }

    /// Fire the mount hook if the element is bound and not yet mounted
    pub fn handle_mount(&mut self, doc: &mut Document, node: NodeId) {
        if let Some(binding) = self.bindings.get_mut(&node) {
            if !binding.mounted {
                binding.broker.on_mount(doc);
                binding.mounted = true;
                tracing::debug!("[Lifecycle] Mounted node {}", node);
            }
        }
    }

    /// Fire the unmount hook if the element is bound and currently mounted
    ///
    /// The binding itself is kept: a re-inserted element reuses its broker.
    pub fn handle_unmount(&mut self, doc: &mut Document, node: NodeId) {
        if let Some(binding) = self.bindings.get_mut(&node) {
            if binding.mounted {
                binding.broker.on_unmount(doc);
                binding.mounted = false;
                tracing::debug!("[Lifecycle] Unmounted node {}", node);
            }
        }
    }

    /// Process all pending mutation records, in delivery order
    ///
    /// Added element nodes (and their registered descendants, document
    /// order) are attached and mounted; removed ones are unmounted. The
    /// whole batch is always processed: a failing broker is logged,
    /// collected, and reported after its siblings were handled.
    pub fn process_mutations(&mut self, doc: &mut Document) -> Result<()> {
        let records = match &self.subscription {
            Some(subscription) => subscription.take_records(),
            None => return Ok(()),
        };

        let mut failures = Vec::new();
        for record in records {
            if record.record_type != RecordType::ChildList {
                continue;
            }

            for &added in &record.added {
                if !doc.get(added)?.is_element() {
                    continue;
                }
                if self.is_registered_element(doc, added)? {
                    self.attach_and_mount(doc, added, &mut failures)?;
                }
                for descendant in doc.subtree_elements(added)? {
                    if self.is_registered_element(doc, descendant)? {
                        self.attach_and_mount(doc, descendant, &mut failures)?;
                    }
                }
            }

            for &removed in &record.removed {
                if !doc.get(removed)?.is_element() {
                    continue;
                }
                self.handle_unmount(doc, removed);
                for descendant in doc.subtree_elements(removed)? {
                    self.handle_unmount(doc, descendant);
                }
            }
        }
        Self::batch_result(failures)
    }

    fn attach_and_mount(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        failures: &mut Vec<BrokerFailure>,
    ) -> Result<()> {
        if self.attach_isolated(doc, node, failures)? {
            self.handle_mount(doc, node);
        }
        Ok(())
    }

    // Returns whether the element is usable (bound) afterwards. A broker
    // construction failure is recorded and must not stop sibling elements.
    fn attach_isolated(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        failures: &mut Vec<BrokerFailure>,
    ) -> Result<bool> {
        match self.attach(doc, node) {
            Ok(_) => Ok(true),
            Err(LifecycleError::BrokerInit {
                element,
                tag,
                source,
            }) => {
                tracing::warn!(
                    "[Lifecycle] Broker for <{}> (node {}) failed: {}; siblings continue",
                    tag,
                    element,
                    source
                );
                failures.push(BrokerFailure {
                    element,
                    tag,
                    source,
                });
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    fn batch_result(failures: Vec<BrokerFailure>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::Batch { failures })
        }
    }

    /// Creation-path hook: the host calls this right after creating an
    /// element, before anyone can observe it
    ///
    /// Attaches when the tag is registered; never mounts (creation is not
    /// insertion — the mount fires once the element actually enters the
    /// tree). A host that cannot call this hook degrades gracefully:
    /// elements are attached on insertion instead.
    pub fn created(&mut self, doc: &mut Document, node: NodeId) -> Result<bool> {
        self.attach(doc, node)
    }

    /// Create an element and run the creation hook in one step
    pub fn create_element(&mut self, doc: &mut Document, tag: &str) -> Result<NodeId> {
        let element = doc.create_element(tag)?;
        self.attach(doc, element)?;
        Ok(element)
    }

    /// Template-helper hook: attach brokers throughout a freshly built
    /// fragment, root included, without mounting anything
    pub fn built(&mut self, doc: &mut Document, root: NodeId) -> Result<()> {
        let mut failures = Vec::new();
        if self.is_registered_element(doc, root)? {
            self.attach_isolated(doc, root, &mut failures)?;
        }
        for descendant in doc.subtree_elements(root)? {
            if self.is_registered_element(doc, descendant)? {
                self.attach_isolated(doc, descendant, &mut failures)?;
            }
        }
        Self::batch_result(failures)
    }

    /// Run `callback` once the element has a broker
    ///
    /// Never synchronous: even for an element that is already attached, the
    /// callback waits for the next [`run_ready_callbacks`] pump. Waiters
    /// for an element that is never attached never fire.
    ///
    /// [`run_ready_callbacks`]: LifecycleEngine::run_ready_callbacks
    pub fn await_ready<F>(&mut self, element: NodeId, callback: F)
    where
        F: FnOnce(&mut Document, NodeId) + 'static,
    {
        if self.bindings.contains_key(&element) {
            self.ready.schedule(element, Box::new(callback));
        } else {
            self.ready.wait(element, Box::new(callback));
        }
    }

    /// Deliver scheduled ready callbacks; the host pumps this the same way
    /// it pumps [`process_mutations`](LifecycleEngine::process_mutations)
    pub fn run_ready_callbacks(&mut self, doc: &mut Document) {
        for (element, callback) in self.ready.drain() {
            callback(doc, element);
        }
    }

    /// Whether the element currently has a broker
    pub fn is_bound(&self, node: NodeId) -> bool {
        self.bindings.contains_key(&node)
    }

    /// Whether the element is bound and currently mounted
    pub fn is_mounted(&self, node: NodeId) -> bool {
        self.bindings.get(&node).is_some_and(|b| b.mounted)
    }

    /// The element's broker, if attached
    pub fn broker(&self, node: NodeId) -> Option<&dyn ElementBroker> {
        self.bindings.get(&node).map(|b| &*b.broker)
    }

    pub fn broker_mut(&mut self, node: NodeId) -> Option<&mut (dyn ElementBroker + 'static)> {
        self.bindings.get_mut(&node).map(|b| &mut *b.broker)
    }
}

impl Default for LifecycleEngine {
    fn default() -> Self {
        Self::new()
    }
}
