//! loupe DOM - Embedded document model
//!
//! Arena-backed DOM tree the selection overlay drives. Nodes are addressed
//! by `NodeId` indices; removed subtrees stay observable (tombstoned) so
//! overlay bookkeeping can detect disconnected targets.

mod classlist;
mod document;
mod geometry;
mod node;
mod tree;

pub use classlist::TokenList;
pub use document::{Document, Viewport};
pub use geometry::Rect;
pub use node::{Attribute, CssPosition, ElementData, Node, NodeData};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Arena slot index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM mutation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} is not in the arena")]
    InvalidNode(NodeId),

    #[error("node {0:?} cannot be inserted into its own subtree")]
    Cycle(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
}
