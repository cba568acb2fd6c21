//! DOM Tree (arena-based allocation)

use crate::{DomError, ElementData, ElementGeometry, Node, NodeId};

/// Arena-based DOM tree
///
/// Slot 0 always holds the document node. Removed nodes stay in the arena
/// as detached subtrees so their ids remain valid for re-insertion.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self { nodes: vec![Node::document()] }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (including the document node)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing but the document node exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.get(parent).ok_or(DomError::UnknownNode(parent))?;
        self.get(child).ok_or(DomError::UnknownNode(child))?;
        if child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        self.detach(child);
        self.link_last(parent, child);
        Ok(())
    }

    /// Create an element as the last child of `parent`, which must exist
    pub(crate) fn create_child_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let child = self.create_element(tag);
        self.link_last(parent, child);
        child
    }

    /// Link a detached `child` after the last child of `parent`
    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
    }

    /// Detach `child` from its parent. The subtree stays in the arena.
    pub fn remove_child(&mut self, child: NodeId) -> Result<(), DomError> {
        self.get(child).ok_or(DomError::UnknownNode(child))?;
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Preorder list of `id` and all its descendants
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children: Vec<NodeId> = self.children(current).map(|(child, _)| child).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Ancestors of `id`, nearest first (excludes `id`)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            out.push(node);
            cursor = self.parent(node);
        }
        out
    }

    /// Inclusive containment: true if `node` is `ancestor` or lies under it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// True if the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains(NodeId::ROOT, id)
    }

    /// Element data for a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for a node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    fn require_element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match self.get_mut(id) {
            None => Err(DomError::UnknownNode(id)),
            Some(node) => node.as_element_mut().ok_or(DomError::NotAnElement(id)),
        }
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.require_element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.require_element_mut(id)?.remove_attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.require_element_mut(id)?.add_class(class);
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.require_element_mut(id)?.remove_class(class);
        Ok(())
    }

    /// Layout box of an element
    pub fn geometry(&self, id: NodeId) -> Option<&ElementGeometry> {
        self.element(id).map(|e| &e.geometry)
    }

    /// Set the layout box size reported for an element
    pub fn set_size(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), DomError> {
        let geometry = &mut self.require_element_mut(id)?.geometry;
        geometry.offset_width = width;
        geometry.offset_height = height;
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .filter_map(|node| self.get(node).and_then(Node::as_text))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.get(id).ok_or(DomError::UnknownNode(id))?;
        let children: Vec<NodeId> = self.children(id).map(|(child, _)| child).collect();
        for child in children {
            self.detach(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    /// First element (preorder) with the given tag under `start`
    pub fn find_by_tag(&self, start: NodeId, tag: &str) -> Option<NodeId> {
        self.subtree(start)
            .into_iter()
            .find(|&node| self.tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let ul = tree.create_element("ul");
        let li = tree.create_element("li");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, ul).unwrap();
        tree.append_child(ul, li).unwrap();
        (tree, div, ul, li)
    }

    #[test]
    fn test_contains_is_inclusive() {
        let (tree, div, ul, li) = sample();
        assert!(tree.contains(ul, ul));
        assert!(tree.contains(ul, li));
        assert!(tree.contains(div, li));
        assert!(!tree.contains(li, ul));
    }

    #[test]
    fn test_remove_child_detaches_subtree() {
        let (mut tree, div, ul, li) = sample();
        tree.remove_child(ul).unwrap();

        assert!(tree.is_connected(div));
        assert!(!tree.is_connected(ul));
        assert!(!tree.is_connected(li));
        assert_eq!(tree.children(div).count(), 0);
        assert_eq!(tree.subtree(ul), vec![ul, li]);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let (mut tree, div, _ul, li) = sample();
        assert_eq!(
            tree.append_child(li, div),
            Err(DomError::HierarchyRequest { parent: li, child: div })
        );
    }

    #[test]
    fn test_sibling_links_after_middle_removal() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        for node in [a, b, c] {
            tree.append_child(tree.root(), node).unwrap();
        }
        tree.remove_child(b).unwrap();

        let order: Vec<NodeId> = tree.children(tree.root()).map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn test_text_content_roundtrip() {
        let (mut tree, _div, _ul, li) = sample();
        tree.set_text_content(li, "7").unwrap();
        assert_eq!(tree.text_content(li), "7");
        tree.set_text_content(li, "8").unwrap();
        assert_eq!(tree.text_content(li), "8");
    }
}
