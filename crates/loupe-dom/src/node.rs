//! DOM Node
//!
//! Arena entry: sibling/child links are `NodeId` indices, not pointers.

use crate::classlist::TokenList;
use crate::geometry::Rect;
use crate::NodeId;

/// DOM node - arena entry
#[derive(Debug)]
pub struct Node {
    /// Parent node (None if detached or root)
    pub parent: Option<NodeId>,
    /// First child
    pub first_child: Option<NodeId>,
    /// Last child (for O(1) append)
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(content) => Some(content),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// CSS position scheme of an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CssPosition {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in document order
    pub attrs: Vec<Attribute>,
    /// Class list
    pub classes: TokenList,
    /// Computed position scheme
    pub position: CssPosition,
    /// Layout rectangle in document coordinates
    pub rect: Rect,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attrs: Vec::new(),
            classes: TokenList::new(),
            position: CssPosition::default(),
            rect: Rect::default(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes = TokenList::from_str_value(value);
        }
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                attr.value = value.to_string();
                return;
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

/// Attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
