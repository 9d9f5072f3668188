//! Tree serializer - render a subtree as indented HTML text
//!
//! Diagnostic surface: tests and debug logging assert on tree shape through
//! this instead of walking the arena by hand. Attributes are emitted in
//! sorted order so output is deterministic.

use crate::document::Document;
use crate::error::Result;
use crate::types::{NodeId, NodeType};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Text nodes longer than this are truncated with an ellipsis
    pub max_text_length: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_text_length: 200,
        }
    }
}

/// Renders subtrees as indented HTML-like text
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the subtree rooted at `start`
    pub fn serialize(&self, doc: &Document, start: NodeId) -> Result<String> {
        let mut output = String::with_capacity(1024);
        self.serialize_node(doc, start, 0, &mut output)?;
        Ok(output)
    }

    fn serialize_node(
        &self,
        doc: &Document,
        node_id: NodeId,
        depth: usize,
        output: &mut String,
    ) -> Result<()> {
        let node = doc.get(node_id)?;
        let indent = "  ".repeat(depth);

        match node.node_type {
            NodeType::Element => {
                output.push_str(&indent);
                output.push('<');
                output.push_str(&node.node_name);

                let mut names: Vec<&String> = node.attributes.keys().collect();
                names.sort();
                for name in names {
                    output.push_str(&format!(" {}=\"{}\"", name, node.attributes[name]));
                }
                output.push_str(">\n");

                for &child_id in &node.children_ids {
                    self.serialize_node(doc, child_id, depth + 1, output)?;
                }

                output.push_str(&indent);
                output.push_str("</");
                output.push_str(&node.node_name);
                output.push_str(">\n");
            }
            NodeType::Text => {
                let text = node.node_value.trim();
                if !text.is_empty() {
                    output.push_str(&indent);
                    output.push_str(&cap_text(text, self.config.max_text_length));
                    output.push('\n');
                }
            }
            NodeType::Document | NodeType::DocumentFragment => {
                for &child_id in &node.children_ids {
                    self.serialize_node(doc, child_id, depth, output)?;
                }
            }
            NodeType::Comment => {}
        }

        Ok(())
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn cap_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let capped: String = text.chars().take(max_len).collect();
        format!("{}...", capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_simple_tree() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let div = doc.create_element("div").unwrap();
        doc.set_attribute(div, "id", "main").unwrap();
        doc.set_attribute(div, "class", "wide").unwrap();
        doc.append_child(body, div).unwrap();
        let text = doc.create_text("Hello");
        doc.append_child(div, text).unwrap();

        let output = DomSerializer::new().serialize(&doc, div).unwrap();
        assert_eq!(output, "<div class=\"wide\" id=\"main\">\n  Hello\n</div>\n");
    }

    #[test]
    fn test_document_node_renders_children_only() {
        let doc = Document::new();
        let output = DomSerializer::new().serialize(&doc, doc.root()).unwrap();
        assert!(output.starts_with("<html>"));
        assert!(output.contains("<body>"));
    }

    #[test]
    fn test_long_text_is_capped() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let text = doc.create_text(&"x".repeat(50));
        doc.append_child(body, text).unwrap();

        let serializer = DomSerializer::with_config(SerializerConfig { max_text_length: 10 });
        let output = serializer.serialize(&doc, body).unwrap();
        assert!(output.contains(&format!("{}...", "x".repeat(10))));
    }
}
