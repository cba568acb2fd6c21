//! Document - High-level document API

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_child_element(tree.root(), "html");
        let head = tree.create_child_element(html, "head");
        let body = tree.create_child_element(html, "body");

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .subtree(self.tree.root())
            .into_iter()
            .find(|&node| self.tree.element(node).and_then(|e| e.id.as_deref()) == Some(id))
    }

    /// First element with the given tag, in document order
    pub fn query_tag(&self, tag: &str) -> Option<NodeId> {
        self.tree.find_by_tag(self.tree.root(), tag)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_is_connected() {
        let doc = Document::new("test://page");
        assert!(doc.tree().is_connected(doc.body()));
        assert_eq!(doc.tree().parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.query_tag("BODY"), Some(doc.body()));
    }

    #[test]
    fn test_get_element_by_id() {
        let mut doc = Document::new("test://page");
        let outer = doc.tree_mut().create_element("div");
        doc.tree_mut().set_attribute(outer, "id", "outer").unwrap();
        let body = doc.body();
        doc.tree_mut().append_child(body, outer).unwrap();

        assert_eq!(doc.get_element_by_id("outer"), Some(outer));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }
}
