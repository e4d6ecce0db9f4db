//! Selection session
//!
//! One `SelectSession` per embedded document. The session owns the editor
//! state, the selection store, the pinned parent origin, the overlay layer
//! and the frame scheduler; the host owns the document and the real message
//! channel. Hosts route inbound messages, pointer events and viewport
//! events into the session, call `run_frame` on their animation tick, and
//! drain `take_outbound` into the channel.

use crate::address::{node_path, stable_id};
use crate::icons::IconProvider;
use crate::overlay::{OverlayLayer, OverlayStyle};
use crate::protocol::{
    Command, Outbound, OutboundEnvelope, Outbox, ParentGateway, RebuildReport, RebuiltElement,
    SelectedElement, SelectionChanged,
};
use crate::state::EditorState;
use crate::store::{SelectionEntry, SelectionStore};
use crate::sync::FrameScheduler;
use crate::SelectError;
use loupe_dom::{Document, NodeId};
use serde_json::Value;

/// Session configuration
///
/// The default allow-list is empty (deny-all); hosts must supply the parent
/// origins they trust.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub allowed_origins: Vec<String>,
    /// Marker class carried by every selected element
    pub selected_class: String,
    /// Exclusive hover highlight class
    pub hover_class: String,
    /// Selection-mode cursor class, applied to <body>
    pub cursor_class: String,
    pub overlay: OverlayStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            selected_class: "lp-selected".into(),
            hover_class: "lp-hover".into(),
            cursor_class: "lp-selecting".into(),
            overlay: OverlayStyle::default(),
        }
    }
}

#[derive(Debug)]
struct PendingBadge {
    target: NodeId,
    id: String,
}

/// Per-embedded-context selection session
#[derive(Debug)]
pub struct SelectSession {
    config: SessionConfig,
    state: EditorState,
    gateway: ParentGateway,
    store: SelectionStore,
    overlay: OverlayLayer,
    scheduler: FrameScheduler,
    outbox: Outbox,
    hovered: Option<NodeId>,
    /// Markers and badges deferred to the next render opportunity
    pending_badges: Vec<PendingBadge>,
}

impl SelectSession {
    /// Create a session in the Initializing state
    pub fn new(config: SessionConfig, icons: Box<dyn IconProvider>) -> Self {
        let gateway = ParentGateway::new(config.allowed_origins.clone());
        let overlay = OverlayLayer::new(config.overlay.clone(), icons);
        Self {
            config,
            state: EditorState::Initializing,
            gateway,
            store: SelectionStore::new(),
            overlay,
            scheduler: FrameScheduler::new(),
            outbox: Outbox::new(),
            hovered: None,
            pending_badges: Vec::new(),
        }
    }

    /// Finish setup: listeners are wired, announce readiness
    ///
    /// The announcement is the one outbound message sent before an origin is
    /// pinned; it goes to the wildcard target so the (not yet identified)
    /// parent can hear it.
    pub fn start(&mut self) {
        if self.state != EditorState::Initializing {
            return;
        }
        self.state = EditorState::Ready;
        self.gateway
            .broadcast(&mut self.outbox, Outbound::status(EditorState::Ready.as_str()));
        tracing::info!("selection session ready");
    }

    /// Current editor state
    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Selection store (read-only)
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Overlay layer (read-only)
    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    /// Pinned parent origin, if any
    pub fn pinned_origin(&self) -> Option<&str> {
        self.gateway.pinned()
    }

    /// Whether a frame pass is scheduled
    pub fn frame_requested(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Drain queued outbound messages, oldest first
    pub fn take_outbound(&mut self) -> Vec<OutboundEnvelope> {
        self.outbox.drain()
    }

    /// Handle one inbound cross-document message
    ///
    /// Untrusted origins are dropped with no acknowledgment and no state
    /// change. Trusted traffic is acknowledged unconditionally (echoing the
    /// raw envelope) before dispatch, unrecognized types included.
    pub fn handle_message(&mut self, doc: &mut Document, origin: &str, message: Value) {
        if !self.gateway.admit(origin) {
            return;
        }
        self.gateway.deliver(
            &mut self.outbox,
            Outbound::Ack {
                message: message.clone(),
            },
        );

        match Command::parse(&message) {
            Command::Ready => self.enter_ready(doc),
            Command::SelectionTool => self.enter_selection(doc),
            Command::ClearSelection => {
                self.clear_selections(doc);
                self.gateway
                    .deliver(&mut self.outbox, Outbound::status("selection-cleared"));
            }
            Command::RemoveSelection { element } => self.remove_command(doc, &element),
            Command::RebuildSelection { ids } => {
                self.rebuild(doc, &ids);
            }
            Command::Unknown(ty) => {
                tracing::debug!("ignoring unrecognized message type: {ty:?}");
            }
        }
    }

    /// Pointer click from the host's capture-phase listener
    ///
    /// Returns true when the click was consumed (the host must suppress the
    /// default action). Outside ElementSelection only badge close
    /// affordances react; page clicks pass through untouched.
    pub fn on_click(&mut self, doc: &mut Document, node: NodeId) -> bool {
        // Badge chrome works in any state while the badge exists
        if let Some(target) = self.overlay.close_affordance_owner(doc, node) {
            if let Some(id) = self.store.entry_for_node(target).map(|e| e.id.clone()) {
                if let Some(entry) = self.remove_selection(doc, &id) {
                    self.emit_selection_changed(doc, &entry.id, &entry.path);
                }
            }
            return true;
        }

        if !self.state.selecting() {
            return false;
        }
        if self.overlay.is_badge_node(doc, node) {
            return true;
        }

        // Toggle off when the element is already selected
        if let Some(id) = self.store.entry_for_node(node).map(|e| e.id.clone()) {
            if let Some(entry) = self.remove_selection(doc, &id) {
                self.emit_selection_changed(doc, &entry.id, &entry.path);
            }
            return true;
        }

        let Some(path) = node_path(doc.tree(), node) else {
            return false;
        };
        let Some(id) = stable_id(&path) else {
            return false;
        };
        // A present id with a different element is a hash collision; treat
        // it as the same toggle.
        if self.store.contains(&id) {
            if let Some(entry) = self.remove_selection(doc, &id) {
                self.emit_selection_changed(doc, &entry.id, &entry.path);
            }
            return true;
        }

        self.add_selection(doc, id, node, path);
        true
    }

    /// Pointer hover from the host; `None` means the pointer left content
    ///
    /// Maintains a single exclusive highlight while selecting; inert
    /// otherwise.
    pub fn on_hover(&mut self, doc: &mut Document, node: Option<NodeId>) {
        if !self.state.selecting() {
            return;
        }
        let target = node.filter(|&n| !self.overlay.is_badge_node(doc, n));
        if self.hovered == target {
            return;
        }
        self.clear_hover(doc);
        if let Some(n) = target {
            if let Some(classes) = doc.tree_mut().classes_mut(n) {
                classes.add(&self.config.hover_class);
                self.hovered = Some(n);
            }
        }
    }

    /// Scroll event (passive listener, attached on first badge creation)
    pub fn on_scroll(&mut self) {
        if self.overlay.viewport_events_wired() {
            self.scheduler.request();
        }
    }

    /// Resize event (passive listener, attached on first badge creation)
    pub fn on_resize(&mut self) {
        if self.overlay.viewport_events_wired() {
            self.scheduler.request();
        }
    }

    /// Animation-frame callback
    ///
    /// Runs at most one pass per request burst: deferred markers and badges
    /// first (so fresh elements have settled geometry), one idempotent icon
    /// render over the batch, then the reposition/orphan sweep. Everything
    /// in the pass is synchronous; no input handling interleaves.
    pub fn run_frame(&mut self, doc: &mut Document) -> Result<(), SelectError> {
        if self.scheduler.take().is_none() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending_badges);
        let mut created = false;
        for badge in pending {
            if !self.store.contains(&badge.id) || !doc.tree().is_connected(badge.target) {
                continue;
            }
            if let Some(classes) = doc.tree_mut().classes_mut(badge.target) {
                classes.add(&self.config.selected_class);
            }
            self.overlay.create_badge(doc, badge.target, &badge.id)?;
            created = true;
        }
        if created {
            self.overlay.render_icons();
        }

        self.overlay.reposition_all(doc);
        Ok(())
    }

    /// Reconstruct a selection from stable identifiers alone
    ///
    /// Clears current state, then scans the whole document computing each
    /// element's identifier and re-adding matches. Returns the identifiers
    /// actually matched (a subset of the request when targets are gone).
    pub fn rebuild(&mut self, doc: &mut Document, requested: &[String]) -> Vec<String> {
        self.clear_selections(doc);

        let mut matched = Vec::new();
        let root = doc.tree().root();
        for node in doc.tree().descendants(root) {
            let Some(path) = node_path(doc.tree(), node) else {
                continue;
            };
            let Some(id) = stable_id(&path) else {
                continue;
            };
            if requested.iter().any(|r| *r == id) && !self.store.contains(&id) {
                matched.push(id.clone());
                self.add_selection(doc, id, node, path);
            }
        }

        if !self.store.is_empty() {
            self.apply_cursor(doc, true);
            self.state = EditorState::ElementSelection;
            self.gateway.deliver(
                &mut self.outbox,
                Outbound::status(EditorState::ElementSelection.as_str()),
            );
        }

        let report = RebuildReport {
            selected_elements: self
                .store
                .iter()
                .map(|e| RebuiltElement {
                    id: e.id.clone(),
                    xpath: e.path.clone(),
                })
                .collect(),
            selected_element_ids: self.store.ids(),
        };
        self.gateway
            .deliver(&mut self.outbox, Outbound::SelectionRebuilt(report));

        tracing::debug!(
            requested = requested.len(),
            matched = matched.len(),
            "selection rebuilt"
        );
        matched
    }

    fn enter_ready(&mut self, doc: &mut Document) {
        self.clear_selections(doc);
        self.clear_hover(doc);
        self.apply_cursor(doc, false);
        self.state = EditorState::Ready;
        self.gateway
            .deliver(&mut self.outbox, Outbound::status(EditorState::Ready.as_str()));
    }

    fn enter_selection(&mut self, doc: &mut Document) {
        self.clear_selections(doc);
        self.clear_hover(doc);
        self.apply_cursor(doc, true);
        self.state = EditorState::ElementSelection;
        self.gateway.deliver(
            &mut self.outbox,
            Outbound::status(EditorState::ElementSelection.as_str()),
        );
    }

    fn remove_command(&mut self, doc: &mut Document, id: &str) {
        // Absent ids are a no-op: the ack already went out, nothing else
        // follows.
        if let Some(entry) = self.remove_selection(doc, id) {
            self.gateway
                .deliver(&mut self.outbox, Outbound::status("selection-removed"));
            self.emit_selection_changed(doc, &entry.id, &entry.path);
        }
    }

    /// Insert an entry and defer its visual work to the next frame
    fn add_selection(&mut self, doc: &Document, id: String, node: NodeId, path: String) {
        self.store.insert(SelectionEntry {
            id: id.clone(),
            node,
            path: path.clone(),
        });
        self.pending_badges.push(PendingBadge {
            target: node,
            id: id.clone(),
        });
        self.scheduler.request();
        self.emit_selection_changed(doc, &id, &path);
    }

    /// Tear down one selection: marker, badge, pending work, store entry
    fn remove_selection(&mut self, doc: &mut Document, id: &str) -> Option<SelectionEntry> {
        let entry = self.store.take(id)?;
        if let Some(classes) = doc.tree_mut().classes_mut(entry.node) {
            classes.remove(&self.config.selected_class);
        }
        self.overlay.dispose(doc, entry.node);
        self.pending_badges.retain(|p| p.id != id);
        Some(entry)
    }

    /// Bulk teardown; deliberately emits nothing
    fn clear_selections(&mut self, doc: &mut Document) {
        for entry in self.store.drain() {
            if let Some(classes) = doc.tree_mut().classes_mut(entry.node) {
                classes.remove(&self.config.selected_class);
            }
            self.overlay.dispose(doc, entry.node);
        }
        self.pending_badges.clear();
    }

    fn clear_hover(&mut self, doc: &mut Document) {
        if let Some(old) = self.hovered.take() {
            if let Some(classes) = doc.tree_mut().classes_mut(old) {
                classes.remove(&self.config.hover_class);
            }
        }
    }

    fn apply_cursor(&mut self, doc: &mut Document, on: bool) {
        let Some(body) = doc.body() else { return };
        if let Some(classes) = doc.tree_mut().classes_mut(body) {
            if on {
                classes.add(&self.config.cursor_class);
            } else {
                classes.remove(&self.config.cursor_class);
            }
        }
    }

    fn emit_selection_changed(&mut self, doc: &Document, changed_id: &str, changed_path: &str) {
        let payload = SelectionChanged {
            selected_elements: self
                .store
                .iter()
                .map(|e| SelectedElement {
                    id: e.id.clone(),
                    tag_name: doc
                        .tree()
                        .tag_name(e.node)
                        .unwrap_or_default()
                        .to_string(),
                    xpath: e.path.clone(),
                })
                .collect(),
            selected_element_ids: self.store.ids(),
            element_id: changed_id.to_string(),
            element_xpath: changed_path.to_string(),
        };
        self.gateway
            .deliver(&mut self.outbox, Outbound::ElementSelection(payload));
    }
}
