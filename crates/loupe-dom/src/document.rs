//! Document - High-level document API
//!
//! Owns the DOM tree plus the viewport scroll state the overlay positions
//! against.

use crate::{DomTree, NodeId, Rect};

/// Viewport dimensions and scroll offset
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// HTML document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Document URL
    url: String,
    /// Viewport state
    viewport: Viewport,
    /// Cached reference to <html> element
    html_element: Option<NodeId>,
    /// Cached reference to <body> element
    body_element: Option<NodeId>,
}

impl Document {
    /// Create a new document with the html/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let body = tree.create_element("body");
        tree.append_child(tree.root(), html).expect("fresh tree");
        tree.append_child(html, body).expect("fresh tree");

        Self {
            tree,
            url: url.to_string(),
            viewport: Viewport::default(),
            html_element: Some(html),
            body_element: Some(body),
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            viewport: Viewport::default(),
            html_element: None,
            body_element: None,
        }
    }

    /// Locate and cache <html>/<body> after external tree construction
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self
            .tree
            .children(root)
            .find(|&id| self.tree.tag_name(id) == Some("html"));
        self.body_element = self.html_element.and_then(|html| {
            self.tree
                .children(html)
                .find(|&id| self.tree.tag_name(id) == Some("body"))
        });
        tracing::debug!(
            html = ?self.html_element,
            body = ?self.body_element,
            "document finalized"
        );
    }

    /// Document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> Option<NodeId> {
        self.html_element
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Current viewport state
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Scroll to an absolute offset
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x.max(0.0);
        self.viewport.scroll_y = y.max(0.0);
    }

    /// Scroll by a delta
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.viewport.scroll_x + dx, self.viewport.scroll_y + dy);
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Bounding rect of an element in viewport coordinates
    ///
    /// Layout rects are stored in document coordinates; the client rect is
    /// the same box translated by the current scroll offset. Fixed-position
    /// elements live in viewport coordinates already and are not translated.
    pub fn bounding_client_rect(&self, id: NodeId) -> Option<Rect> {
        let rect = self.tree.layout_rect(id)?;
        if self.tree.position(id) == Some(crate::CssPosition::Fixed) {
            return Some(rect);
        }
        Some(rect.translated(-self.viewport.scroll_x, -self.viewport.scroll_y))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
