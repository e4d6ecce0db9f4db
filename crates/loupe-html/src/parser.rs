//! HTML5 parser glue
//!
//! Uses html5ever's built-in RcDom and converts to our DOM format.

use crate::LoadError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use loupe_dom::{Document, DomTree, NodeId};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML loader
#[derive(Debug, Default)]
pub struct HtmlLoader;

impl HtmlLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML text into a Document
    pub fn parse(&self, html: &str) -> Result<Document, LoadError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, LoadError> {
        tracing::debug!("parsing document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut document = Document::empty(url);
        convert_node(&dom.document, document.tree_mut(), NodeId::ROOT)?;
        document.finalize();

        tracing::debug!("parsed {} nodes", document.tree().len());
        Ok(document)
    }
}

/// Convert an RcDom node's children under `parent` in our arena
fn convert_node(handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), LoadError> {
    for child in handle.children.borrow().iter() {
        match &child.data {
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attr(id, &attr.name.local, &attr.value)?;
                }
                tree.append_child(parent, id)?;
                convert_node(child, tree, id)?;
            }
            RcNodeData::Text { contents } => {
                let content = contents.borrow().to_string();
                if !content.trim().is_empty() {
                    let id = tree.create_text(&content);
                    tree.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(&contents.to_string());
                tree.append_child(parent, id)?;
            }
            // Doctype and processing instructions carry nothing the overlay
            // addresses; skip them.
            _ => {}
        }
    }
    Ok(())
}
