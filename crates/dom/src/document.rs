//! Arena-backed live document tree
//!
//! Design:
//! - Single Vec<NodeData> for storage, ids are indices
//! - Nodes are never freed and ids are never reused: a node removed from
//!   the tree stays addressable, so identity survives removal and
//!   re-insertion (there is no "element destroyed" notification to build on)
//! - Every structural mutation is reported to matching observers before the
//!   mutating call returns

use crate::error::{DomError, Result};
use crate::observer::{
    MutationRecord, MutationSubscription, ObserverEntry, ObserverId, ObserverOptions, RecordQueue,
};
use crate::types::{NodeData, NodeId, NodeType};
use smallvec::{smallvec, SmallVec};

/// The live tree: node arena, structural mutation entry points, and
/// observer bookkeeping
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root_id: NodeId,
    observers: Vec<ObserverEntry>,
    next_observer_id: ObserverId,
}

impl Document {
    /// Create a document with the usual `#document` → `<html>` → `<body>`
    /// skeleton
    pub fn new() -> Self {
        let mut doc = Self::empty();
        // Infallible: fresh ids, valid parents, no observers yet.
        let html = doc.alloc(NodeType::Element, "html".to_string());
        let body = doc.alloc(NodeType::Element, "body".to_string());
        let root = doc.root_id;
        let _ = doc.append_child(root, html);
        let _ = doc.append_child(html, body);
        doc
    }

    /// Create a document holding only the `#document` root
    ///
    /// Observers that want the content container fall back to the root
    /// until a `<body>` exists.
    pub fn empty() -> Self {
        let mut doc = Self {
            nodes: Vec::with_capacity(64),
            root_id: 0,
            observers: Vec::new(),
            next_observer_id: 1,
        };
        doc.root_id = doc.alloc(NodeType::Document, "#document".to_string());
        doc
    }

    fn alloc(&mut self, node_type: NodeType, node_name: String) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(NodeData::new(node_id, node_type, node_name));
        node_id
    }

    /// Create a floating element, not yet part of the tree
    ///
    /// The tag is stored lowercase. Creation is not insertion: no mutation
    /// record is emitted until the element is appended somewhere.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() || tag.chars().any(|c| c.is_whitespace()) {
            return Err(DomError::InvalidTagName(tag.to_string()));
        }
        Ok(self.alloc(NodeType::Element, tag.to_ascii_lowercase()))
    }

    /// Create a floating text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeType::Text, "#text".to_string());
        self.nodes[id as usize].node_value = text.to_string();
        id
    }

    /// Get node by id (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by id (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// The `#document` root
    pub fn root(&self) -> NodeId {
        self.root_id
    }

    /// The primary content container, if one exists in the live tree
    pub fn body(&self) -> Option<NodeId> {
        self.collect_elements(self.root_id)
            .into_iter()
            .find(|&id| self.nodes[id as usize].has_tag("body"))
    }

    /// Children of a node, in document order
    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(node_id)?.children_ids)
    }

    /// Total number of nodes ever created
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// DOM-style containment: true when `node` is `ancestor` or lies in its
    /// subtree
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id as usize).and_then(|n| n.parent_id);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        self.contains(self.root_id, node_id)
    }

    /// Append `child` as the last child of `parent`
    ///
    /// A child that already sits elsewhere in the tree is first removed from
    /// its old parent, emitting the removal record there, exactly like the
    /// browser's `appendChild`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.get(parent)?.can_have_children() {
            return Err(DomError::InvalidParent(parent));
        }
        self.get(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyViolation { parent, child });
        }

        if let Some(old_parent) = self.nodes[child as usize].parent_id {
            self.unlink(old_parent, child)?;
            self.emit_child_list(old_parent, SmallVec::new(), smallvec![child]);
        }

        self.nodes[child as usize].parent_id = Some(parent);
        self.nodes[parent as usize].children_ids.push(child);
        self.emit_child_list(parent, smallvec![child], SmallVec::new());
        Ok(())
    }

    /// Remove `child` from `parent`; the subtree stays alive and addressable
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        if self.get(child)?.parent_id != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(parent, child)?;
        self.emit_child_list(parent, SmallVec::new(), smallvec![child]);
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let children = &mut self.nodes[parent as usize].children_ids;
        let position = children
            .iter()
            .position(|&id| id == child)
            .ok_or(DomError::NotAChild { parent, child })?;
        children.remove(position);
        self.nodes[child as usize].parent_id = None;
        Ok(())
    }

    /// Set an attribute on an element, reporting the change to attribute
    /// observers
    pub fn set_attribute(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        if !self.get(node_id)?.is_element() {
            return Err(DomError::NotAnElement(node_id));
        }
        let old_value = self.nodes[node_id as usize]
            .attributes
            .insert(name.to_string(), value.to_string());
        self.emit_attribute(node_id, name, old_value);
        Ok(())
    }

    /// Remove an attribute; a no-op (and no record) when it was absent
    pub fn remove_attribute(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        if !self.get(node_id)?.is_element() {
            return Err(DomError::NotAnElement(node_id));
        }
        if let Some(old_value) = self.nodes[node_id as usize].attributes.remove(name) {
            self.emit_attribute(node_id, name, Some(old_value));
        }
        Ok(())
    }

    /// All element descendants of `start`, document order, excluding `start`
    ///
    /// Works on detached subtrees too, which is what removal processing
    /// needs.
    pub fn subtree_elements(&self, start: NodeId) -> Result<Vec<NodeId>> {
        self.get(start)?;
        Ok(self.collect_elements(start))
    }

    /// All elements in the live tree, document order
    pub fn connected_elements(&self) -> Vec<NodeId> {
        self.collect_elements(self.root_id)
    }

    /// Live elements matching a tag name, document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.connected_elements()
            .into_iter()
            .filter(|&id| self.nodes[id as usize].has_tag(tag))
            .collect()
    }

    /// First descendant of `start` carrying the attribute, document order
    pub fn descendant_with_attribute(&self, start: NodeId, name: &str) -> Result<Option<NodeId>> {
        self.get(start)?;
        Ok(self
            .collect_elements(start)
            .into_iter()
            .find(|&id| self.nodes[id as usize].attr(name).is_some()))
    }

    // Iterative depth-first walk with an explicit stack; children are pushed
    // in reverse so they are visited left-to-right. `start` itself is not
    // collected, matching querySelectorAll scoping.
    fn collect_elements(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if node.is_element() && node_id != start {
                result.push(node_id);
            }
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        result
    }

    /// Register an observer for mutations at `target` (and, with
    /// `options.subtree`, below it)
    pub fn observe(&mut self, target: NodeId, options: ObserverOptions) -> Result<MutationSubscription> {
        self.get(target)?;
        let id = self.next_observer_id;
        self.next_observer_id += 1;

        let queue = RecordQueue::default();
        self.observers.push(ObserverEntry {
            id,
            target,
            options,
            queue: queue.clone(),
        });
        Ok(MutationSubscription::new(id, queue))
    }

    /// Stop delivering records to a subscription
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.retain(|entry| entry.id != id);
    }

    /// Number of live observer registrations
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn in_scope(&self, entry: &ObserverEntry, mutation_point: NodeId) -> bool {
        if entry.options.subtree {
            self.contains(entry.target, mutation_point)
        } else {
            entry.target == mutation_point
        }
    }

    fn emit_child_list(
        &self,
        parent: NodeId,
        added: SmallVec<[NodeId; 2]>,
        removed: SmallVec<[NodeId; 2]>,
    ) {
        if self.observers.is_empty() {
            return;
        }
        let record = MutationRecord::child_list(parent, added, removed);
        for entry in &self.observers {
            if entry.options.child_list && self.in_scope(entry, parent) {
                entry.queue.borrow_mut().push_back(record.clone());
            }
        }
    }

    fn emit_attribute(&self, node_id: NodeId, name: &str, old_value: Option<String>) {
        if self.observers.is_empty() {
            return;
        }
        let record = MutationRecord::attribute(node_id, name.to_string(), old_value);
        for entry in &self.observers {
            if entry.wants_attribute(name) && self.in_scope(entry, node_id) {
                entry.queue.borrow_mut().push_back(record.clone());
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordType;

    #[test]
    fn test_new_document_has_body() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        assert!(doc.get(body).unwrap().has_tag("body"));
        assert!(doc.is_connected(body));
    }

    #[test]
    fn test_empty_document_has_no_body() {
        let doc = Document::empty();
        assert_eq!(doc.body(), None);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_create_element_lowercases_tag() {
        let mut doc = Document::new();
        let id = doc.create_element("SZN-Tabs").unwrap();
        assert_eq!(doc.get(id).unwrap().tag_name(), Some("szn-tabs"));
        assert!(!doc.is_connected(id));
    }

    #[test]
    fn test_create_element_rejects_garbage() {
        let mut doc = Document::new();
        assert!(doc.create_element("").is_err());
        assert!(doc.create_element("szn tabs").is_err());
    }

    #[test]
    fn test_append_and_remove_emit_records() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let subscription = doc
            .observe(body, ObserverOptions::subtree_child_list())
            .unwrap();

        let div = doc.create_element("div").unwrap();
        doc.append_child(body, div).unwrap();
        doc.remove_child(body, div).unwrap();

        let records = subscription.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].added.as_slice(), &[div]);
        assert_eq!(records[1].removed.as_slice(), &[div]);
        assert!(records.iter().all(|r| r.target == body));
    }

    #[test]
    fn test_reparenting_emits_removal_then_addition() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let left = doc.create_element("div").unwrap();
        let right = doc.create_element("div").unwrap();
        doc.append_child(body, left).unwrap();
        doc.append_child(body, right).unwrap();
        let child = doc.create_element("span").unwrap();
        doc.append_child(left, child).unwrap();

        let subscription = doc
            .observe(body, ObserverOptions::subtree_child_list())
            .unwrap();
        doc.append_child(right, child).unwrap();

        let records = subscription.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, left);
        assert_eq!(records[0].removed.as_slice(), &[child]);
        assert_eq!(records[1].target, right);
        assert_eq!(records[1].added.as_slice(), &[child]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let outer = doc.create_element("div").unwrap();
        let inner = doc.create_element("div").unwrap();
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert!(matches!(
            doc.append_child(inner, outer),
            Err(DomError::HierarchyViolation { .. })
        ));
        assert!(matches!(
            doc.append_child(inner, inner),
            Err(DomError::HierarchyViolation { .. })
        ));
    }

    #[test]
    fn test_text_nodes_cannot_hold_children() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let text = doc.create_text("hello");
        doc.append_child(body, text).unwrap();
        let div = doc.create_element("div").unwrap();
        assert!(matches!(
            doc.append_child(text, div),
            Err(DomError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_subtree_queries_are_document_order() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let a = doc.create_element("div").unwrap();
        let b = doc.create_element("span").unwrap();
        let c = doc.create_element("span").unwrap();
        doc.append_child(body, a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(body, c).unwrap();

        assert_eq!(doc.subtree_elements(body).unwrap(), vec![a, b, c]);
        assert_eq!(doc.elements_by_tag("span"), vec![b, c]);
        assert_eq!(doc.elements_by_tag("SPAN"), vec![b, c]);
    }

    #[test]
    fn test_detached_subtree_queries_still_work() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let outer = doc.create_element("div").unwrap();
        let inner = doc.create_element("span").unwrap();
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.remove_child(body, outer).unwrap();

        assert!(!doc.is_connected(outer));
        assert_eq!(doc.subtree_elements(outer).unwrap(), vec![inner]);
    }

    #[test]
    fn test_descendant_with_attribute() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let host = doc.create_element("szn-select").unwrap();
        let ui = doc.create_element("div").unwrap();
        doc.append_child(body, host).unwrap();
        doc.append_child(host, ui).unwrap();
        doc.set_attribute(ui, "data-szn-select-ui", "").unwrap();

        assert_eq!(
            doc.descendant_with_attribute(host, "data-szn-select-ui")
                .unwrap(),
            Some(ui)
        );
        assert_eq!(doc.descendant_with_attribute(host, "data-other").unwrap(), None);
    }

    #[test]
    fn test_attribute_records_respect_filter() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let input = doc.create_element("input").unwrap();
        doc.append_child(body, input).unwrap();

        let subscription = doc
            .observe(input, ObserverOptions::attribute_filter(["disabled"]))
            .unwrap();

        doc.set_attribute(input, "disabled", "").unwrap();
        doc.set_attribute(input, "class", "wide").unwrap();
        doc.set_attribute(input, "disabled", "disabled").unwrap();
        doc.remove_attribute(input, "disabled").unwrap();
        doc.remove_attribute(input, "missing").unwrap();

        let records = subscription.take_records();
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.record_type == RecordType::Attributes
                && r.attribute_name.as_deref() == Some("disabled")));
        assert_eq!(records[0].attribute_old_value, None);
        assert_eq!(records[1].attribute_old_value.as_deref(), Some(""));
        assert_eq!(records[2].attribute_old_value.as_deref(), Some("disabled"));
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let subscription = doc
            .observe(body, ObserverOptions::subtree_child_list())
            .unwrap();

        doc.disconnect(subscription.id());
        let div = doc.create_element("div").unwrap();
        doc.append_child(body, div).unwrap();

        assert!(subscription.is_empty());
    }

    #[test]
    fn test_non_subtree_observer_ignores_deeper_mutations() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let outer = doc.create_element("div").unwrap();
        doc.append_child(body, outer).unwrap();

        let options = ObserverOptions {
            child_list: true,
            ..ObserverOptions::default()
        };
        let subscription = doc.observe(body, options).unwrap();

        let inner = doc.create_element("span").unwrap();
        doc.append_child(outer, inner).unwrap();
        assert!(subscription.is_empty());

        let direct = doc.create_element("span").unwrap();
        doc.append_child(body, direct).unwrap();
        assert_eq!(subscription.take_records().len(), 1);
    }
}
