//! DOM Tree (arena-based allocation)
//!
//! Nodes live in a flat arena; removal detaches a subtree but keeps its
//! slots, so stale `NodeId` handles stay observable and simply report
//! `is_connected() == false`.

use crate::{CssPosition, DomError, ElementData, Node, NodeData, NodeId, Rect, TokenList};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree holding only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// Document root ID
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Comment(content.to_string()))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.get(parent).is_none() {
            return Err(DomError::InvalidNode(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::InvalidNode(child));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(DomError::Cycle(child));
        }

        self.detach(child);

        match self.get(parent).and_then(|n| n.last_child) {
            Some(last) => {
                self.nodes[last.index()].next_sibling = Some(child);
                self.nodes[child.index()].prev_sibling = Some(last);
            }
            None => {
                self.nodes[parent.index()].first_child = Some(child);
            }
        }
        self.nodes[parent.index()].last_child = Some(child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent and siblings (children stay attached to it)
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.nodes[n.index()].prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last_child = prev;
                }
            }
        }

        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Remove a subtree from the document; its slots are tombstoned, not freed
    pub fn remove_subtree(&mut self, id: NodeId) {
        tracing::trace!("removing subtree rooted at {:?}", id);
        self.detach(id);
    }

    /// Check whether a node is still reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return true;
        }
        self.ancestors(id).any(|a| a == NodeId::ROOT)
    }

    /// Iterate over the children of a node in document order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.get(id).and_then(|n| n.first_child);
        std::iter::successors(first, move |&c| self.get(c).and_then(|n| n.next_sibling))
    }

    /// Iterate from a node's parent up to the document root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let parent = self.get(id).and_then(|n| n.parent);
        std::iter::successors(parent, move |&p| self.get(p).and_then(|n| n.parent))
    }

    /// All descendants of a node in document order (the node itself excluded)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut kids: Vec<NodeId> = self.children(next).collect();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag.as_str())
    }

    /// Element data of a node
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| n.as_element())
    }

    /// Mutable element data of a node
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Mutable class list of an element
    pub fn classes_mut(&mut self, id: NodeId) -> Option<&mut TokenList> {
        self.as_element_mut(id).map(|e| &mut e.classes)
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match self.as_element_mut(id) {
            Some(elem) => {
                elem.set_attr(name, value);
                Ok(())
            }
            None => Err(DomError::NotAnElement(id)),
        }
    }

    /// Computed position scheme of an element
    pub fn position(&self, id: NodeId) -> Option<CssPosition> {
        self.as_element(id).map(|e| e.position)
    }

    /// Set the position scheme of an element
    pub fn set_position(&mut self, id: NodeId, position: CssPosition) -> Result<(), DomError> {
        match self.as_element_mut(id) {
            Some(elem) => {
                elem.position = position;
                Ok(())
            }
            None => Err(DomError::NotAnElement(id)),
        }
    }

    /// Layout rectangle of an element, in document coordinates
    pub fn layout_rect(&self, id: NodeId) -> Option<Rect> {
        self.as_element(id).map(|e| e.rect)
    }

    /// Record the layout rectangle of an element
    pub fn set_layout_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DomError> {
        match self.as_element_mut(id) {
            Some(elem) => {
                elem.rect = rect;
                Ok(())
            }
            None => Err(DomError::NotAnElement(id)),
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}
