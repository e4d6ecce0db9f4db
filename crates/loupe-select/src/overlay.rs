//! Overlay renderer
//!
//! Floating badges annotating selected elements. A badge is never inserted
//! under its target (top-level attachment avoids inherited clipping); the
//! element↔badge association lives in a non-owning side table, and a badge
//! whose target leaves the document is reaped by the next reposition pass.

use crate::icons::{category_for_tag, IconLoader, IconProvider};
use crate::SelectError;
use loupe_dom::{CssPosition, Document, NodeId, Rect};
use std::collections::HashMap;

/// Class names and metrics for badge construction
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub badge_class: String,
    pub icon_class: String,
    pub label_class: String,
    pub close_class: String,
    /// Added to static-positioned targets so the badge has an anchor box
    pub anchor_class: String,
    pub badge_width: f64,
    pub badge_height: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            badge_class: "lp-badge".into(),
            icon_class: "lp-badge-icon".into(),
            label_class: "lp-badge-label".into(),
            close_class: "lp-badge-close".into(),
            anchor_class: "lp-anchored".into(),
            badge_width: 96.0,
            badge_height: 20.0,
        }
    }
}

/// One floating badge
#[derive(Debug)]
pub struct Badge {
    /// The badge's own DOM node
    pub node: NodeId,
    /// The element it annotates
    pub target: NodeId,
    /// Category label resolved from the target's tag
    pub category: &'static str,
    /// False when the icon capability was unavailable (text placeholder)
    pub icon_rendered: bool,
    /// Current viewport position
    pub rect: Rect,
}

/// Badge renderer and the target↔badge side table
pub struct OverlayLayer {
    style: OverlayStyle,
    icons: IconLoader,
    /// Non-owning association keyed by target element
    badges: HashMap<NodeId, Badge>,
    viewport_events_wired: bool,
}

impl OverlayLayer {
    pub fn new(style: OverlayStyle, icons: Box<dyn IconProvider>) -> Self {
        Self {
            style,
            icons: IconLoader::new(icons),
            badges: HashMap::new(),
            viewport_events_wired: false,
        }
    }

    /// Number of live badges
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Badge annotating a target element, if any
    pub fn badge_for(&self, target: NodeId) -> Option<&Badge> {
        self.badges.get(&target)
    }

    /// Whether scroll/resize listeners should be attached by now
    ///
    /// Flips on first badge creation and never resets (the listeners are
    /// passive and are never detached).
    pub fn viewport_events_wired(&self) -> bool {
        self.viewport_events_wired
    }

    /// Build and attach a badge for a selected element
    ///
    /// No-op when the target already carries a badge. Triggers the one-time
    /// icon capability load; on failure the badge gets a text placeholder
    /// and everything else stays functional.
    pub fn create_badge(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        id: &str,
    ) -> Result<(), SelectError> {
        if self.badges.contains_key(&target) {
            return Ok(());
        }

        // Static targets get the anchoring marker class instead of a layout
        // mutation.
        if doc.tree().position(target) == Some(CssPosition::Static) {
            if let Some(classes) = doc.tree_mut().classes_mut(target) {
                classes.add(&self.style.anchor_class);
            }
        }

        let tag = doc
            .tree()
            .tag_name(target)
            .unwrap_or_default()
            .to_string();
        let category = category_for_tag(&tag);
        let icon_loaded = self.icons.ensure_loaded().is_some();

        let tree = doc.tree_mut();
        let badge = tree.create_element("div");
        tree.classes_mut(badge)
            .expect("badge is an element")
            .add(&self.style.badge_class);

        let icon = tree.create_element("span");
        tree.classes_mut(icon)
            .expect("icon is an element")
            .add(&self.style.icon_class);
        tree.set_attr(icon, "data-icon", category)?;
        if !icon_loaded {
            let placeholder = tree.create_text(category);
            tree.append_child(icon, placeholder)?;
        }
        tree.append_child(badge, icon)?;

        let label = tree.create_element("span");
        tree.classes_mut(label)
            .expect("label is an element")
            .add(&self.style.label_class);
        let label_text = tree.create_text(&tag);
        tree.append_child(label, label_text)?;
        tree.append_child(badge, label)?;

        let id_text = tree.create_text(id);
        tree.append_child(badge, id_text)?;

        let close = tree.create_element("span");
        tree.classes_mut(close)
            .expect("close is an element")
            .add(&self.style.close_class);
        let close_text = tree.create_text("\u{00d7}");
        tree.append_child(close, close_text)?;
        tree.append_child(badge, close)?;

        // Top-level attachment: the badge is a sibling of page content,
        // never a child of its target.
        let host = doc.body().unwrap_or_else(|| doc.tree().root());
        doc.tree_mut().append_child(host, badge)?;
        doc.tree_mut().set_position(badge, CssPosition::Fixed)?;

        let rect = doc
            .bounding_client_rect(target)
            .map(|r| self.anchor_rect(r))
            .unwrap_or_default();
        doc.tree_mut().set_layout_rect(badge, rect)?;

        self.badges.insert(
            target,
            Badge {
                node: badge,
                target,
                category,
                icon_rendered: icon_loaded,
                rect,
            },
        );
        self.viewport_events_wired = true;
        Ok(())
    }

    /// Re-run the icon renderer over current badges (idempotent)
    pub fn render_icons(&mut self) {
        if let Some(capability) = self.icons.ensure_loaded() {
            capability.render_all();
        }
    }

    /// Dispose the badge annotating `target`, if any
    pub fn dispose(&mut self, doc: &mut Document, target: NodeId) {
        if let Some(badge) = self.badges.remove(&target) {
            doc.tree_mut().remove_subtree(badge.node);
        }
    }

    /// Dispose every badge
    pub fn dispose_all(&mut self, doc: &mut Document) {
        let targets: Vec<NodeId> = self.badges.keys().copied().collect();
        for target in targets {
            self.dispose(doc, target);
        }
    }

    /// Recompute every live badge's viewport position; reap orphans
    ///
    /// Returns the targets whose badges were disposed because the target is
    /// no longer attached to the document.
    pub fn reposition_all(&mut self, doc: &mut Document) -> Vec<NodeId> {
        let targets: Vec<NodeId> = self.badges.keys().copied().collect();
        let mut orphaned = Vec::new();

        for target in targets {
            if !doc.tree().is_connected(target) {
                self.dispose(doc, target);
                orphaned.push(target);
                continue;
            }
            if let Some(target_rect) = doc.bounding_client_rect(target) {
                let rect = self.anchor_rect(target_rect);
                if let Some(badge) = self.badges.get_mut(&target) {
                    badge.rect = rect;
                    let node = badge.node;
                    if let Err(err) = doc.tree_mut().set_layout_rect(node, rect) {
                        tracing::warn!("badge reposition failed: {err}");
                    }
                }
            }
        }

        if !orphaned.is_empty() {
            tracing::debug!("disposed {} orphaned badges", orphaned.len());
        }
        orphaned
    }

    /// If `node` is (inside) a badge's close affordance, the badge's target
    pub fn close_affordance_owner(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let tree = doc.tree();
        let owner = self.owning_badge(doc, node)?;

        let mut current = Some(node);
        while let Some(id) = current {
            if tree
                .as_element(id)
                .is_some_and(|e| e.classes.contains(&self.style.close_class))
            {
                return Some(owner);
            }
            if self.badges.get(&owner).is_some_and(|b| b.node == id) {
                break;
            }
            current = tree.get(id).and_then(|n| n.parent);
        }
        None
    }

    /// Whether a node belongs to any badge subtree
    pub fn is_badge_node(&self, doc: &Document, node: NodeId) -> bool {
        self.owning_badge(doc, node).is_some()
    }

    /// Target of the badge whose subtree contains `node`
    fn owning_badge(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let tree = doc.tree();
        self.badges
            .values()
            .find(|b| b.node == node || tree.ancestors(node).any(|a| a == b.node))
            .map(|b| b.target)
    }

    fn anchor_rect(&self, target: Rect) -> Rect {
        Rect::from_xywh(
            target.x,
            target.y - self.style.badge_height,
            self.style.badge_width,
            self.style.badge_height,
        )
    }
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("badges", &self.badges.len())
            .field("icons", &self.icons)
            .finish()
    }
}
