//! Core node type definitions
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for child lists (most nodes have few children)
//! 3. Navigation via indices, never via owned subtrees

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into the document arena)
///
/// Ids are never reused for the lifetime of a [`Document`](crate::Document),
/// so a `NodeId` held across removal and re-insertion keeps referring to the
/// same physical node.
pub type NodeId = u32;

/// Node kind, matching the DOM numeric node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    DocumentFragment = 11,
}

/// A single node in the document arena
///
/// Tag names are stored lowercase; matching against live tag names is
/// ASCII-case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub node_id: NodeId,
    pub node_type: NodeType,

    /// Lowercase tag name for elements, `#text`/`#comment`/`#document` markers
    /// for the rest.
    pub node_name: String,

    /// Text content for text/comment nodes, empty otherwise.
    pub node_value: String,

    pub attributes: HashMap<String, String>,

    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,
}

impl NodeData {
    pub fn new(node_id: NodeId, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            node_type,
            node_name,
            node_value: String::new(),
            attributes: HashMap::new(),
            parent_id: None,
            children_ids: SmallVec::new(),
        }
    }

    /// Check if the node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.is_element() {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check whether an element's tag matches `tag`, ignoring ASCII case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(tag)
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Check whether the node may hold children
    pub fn can_have_children(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        )
    }
}
