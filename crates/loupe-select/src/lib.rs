//! loupe select - Element selection overlay
//!
//! The embedded side of a parent-driven element picker: stable structural
//! addressing, a selection store with floating badges, and a cross-document
//! message protocol with origin pinning. One `SelectSession` per embedded
//! document; the host wires viewport and pointer events to it and drains
//! its outbound queue into the real message channel.

pub mod address;
pub mod icons;
pub mod overlay;
pub mod protocol;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;

pub use icons::{IconCapability, IconError, IconProvider};
pub use overlay::{Badge, OverlayLayer, OverlayStyle};
pub use protocol::{Command, Outbound, OutboundEnvelope, ParentGateway, Target};
pub use session::{SelectSession, SessionConfig};
pub use state::EditorState;
pub use store::{SelectionEntry, SelectionStore};

/// Selection overlay error
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("dom error: {0}")]
    Dom(#[from] loupe_dom::DomError),

    #[error("icon capability failed: {0}")]
    Icon(#[from] icons::IconError),
}
