//! Edge case tests for loupe-select
//!
//! Rare scenarios and boundary conditions: origin handling, malformed
//! payloads, hover exclusivity, badge chrome, and scheduling coalescing.

use loupe_dom::{Document, NodeId, Rect};
use loupe_html::HtmlLoader;
use loupe_select::address::{node_path, stable_id};
use loupe_select::icons::NoIcons;
use loupe_select::{
    EditorState, IconCapability, IconError, IconProvider, Outbound, SelectSession, SessionConfig,
    Target,
};
use serde_json::json;

const PARENT: &str = "https://studio.example";
const INTRUDER: &str = "https://evil.example";

struct OkIcons;

impl IconProvider for OkIcons {
    fn load(&mut self) -> Result<Box<dyn IconCapability>, IconError> {
        struct Cap;
        impl IconCapability for Cap {
            fn render_all(&mut self) {}
        }
        Ok(Box::new(Cap))
    }
}

fn page() -> Document {
    let mut doc = HtmlLoader::new()
        .parse(
            "<html><body>\
             <div id=\"hero\">intro</div>\
             <div id=\"card\">body</div>\
             </body></html>",
        )
        .expect("fixture parses");
    let root = doc.tree().root();
    let mut y = 100.0;
    for id in doc.tree().descendants(root) {
        if doc.tree().as_element(id).is_some() {
            doc.tree_mut()
                .set_layout_rect(id, Rect::from_xywh(10.0, y, 300.0, 40.0))
                .unwrap();
            y += 50.0;
        }
    }
    doc
}

fn by_id(doc: &Document, wanted: &str) -> NodeId {
    let root = doc.tree().root();
    doc.tree()
        .descendants(root)
        .into_iter()
        .find(|&n| {
            doc.tree()
                .as_element(n)
                .is_some_and(|e| e.get_attr("id") == Some(wanted))
        })
        .unwrap_or_else(|| panic!("no element with id {wanted}"))
}

fn session() -> SelectSession {
    let config = SessionConfig {
        allowed_origins: vec![PARENT.into()],
        ..SessionConfig::default()
    };
    let mut session = SelectSession::new(config, Box::new(OkIcons));
    session.start();
    session
}

fn selecting_session(doc: &mut Document) -> SelectSession {
    let mut s = session();
    s.handle_message(doc, PARENT, json!({"type": "tool-element-selection"}));
    s.take_outbound();
    s
}

// ============================================================================
// ORIGIN HANDLING
// ============================================================================

#[test]
fn test_untrusted_origin_gets_nothing() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    session.handle_message(&mut doc, INTRUDER, json!({"type": "tool-element-selection"}));

    // No ack, no state change, no pin
    assert!(session.take_outbound().is_empty());
    assert_eq!(session.state(), EditorState::Ready);
    assert_eq!(session.pinned_origin(), None);
}

#[test]
fn test_untrusted_origin_after_pinning_still_rejected() {
    let mut doc = page();
    let mut session = session();
    session.handle_message(&mut doc, PARENT, json!({"type": "ready"}));
    session.take_outbound();

    session.handle_message(&mut doc, INTRUDER, json!({"type": "clear-selection"}));
    assert!(session.take_outbound().is_empty());
    assert_eq!(session.pinned_origin(), Some(PARENT));
}

#[test]
fn test_outbound_dropped_before_pinning() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    // Force an unpinned session that is still in selection mode: new
    // session, no parent message yet.
    let config = SessionConfig {
        allowed_origins: vec![PARENT.into()],
        ..SessionConfig::default()
    };
    let mut fresh = SelectSession::new(config, Box::new(OkIcons));
    fresh.start();
    fresh.take_outbound();
    fresh.rebuild(&mut doc, &[]);

    // The rebuild report had nowhere to go; dropped silently
    assert!(fresh.take_outbound().is_empty());

    // Sanity: the pinned session does deliver
    session.handle_message(&mut doc, PARENT, json!({"type": "clear-selection"}));
    assert!(!session.take_outbound().is_empty());
}

#[test]
fn test_ack_echoes_raw_envelope() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    let envelope = json!({"type": "mystery", "payload": {"extra": [1, 2, 3]}, "junk": true});
    session.handle_message(&mut doc, PARENT, envelope.clone());

    let out = session.take_outbound();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].target, Target::Origin(PARENT.into()));
    assert_eq!(out[0].message, Outbound::Ack { message: envelope });
}

// ============================================================================
// MALFORMED AND DEGRADED PAYLOADS
// ============================================================================

#[test]
fn test_remove_without_payload_is_ack_only() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    session.handle_message(&mut doc, PARENT, json!({"type": "remove-selection"}));
    let out = session.take_outbound();
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0].message, Outbound::Ack { .. }));
}

#[test]
fn test_remove_absent_id_is_ack_only() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    session.handle_message(
        &mut doc,
        PARENT,
        json!({"type": "remove-selection", "payload": {"element": "nosuch"}}),
    );
    let out = session.take_outbound();
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0].message, Outbound::Ack { .. }));
}

#[test]
fn test_rebuild_with_non_array_ids_clears_and_reports_empty() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);
    session.take_outbound();

    session.handle_message(
        &mut doc,
        PARENT,
        json!({"type": "rebuild-selection", "payload": {"ids": 7}}),
    );

    assert!(session.store().is_empty());
    // Already in selection mode; rebuild with no matches leaves state alone
    assert_eq!(session.state(), EditorState::ElementSelection);

    let out = session.take_outbound();
    let Outbound::SelectionRebuilt(report) = &out[1].message else {
        panic!("expected selection-rebuilt");
    };
    assert!(report.selected_element_ids.is_empty());
}

// ============================================================================
// HOVER HIGHLIGHT
// ============================================================================

#[test]
fn test_hover_is_exclusive() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    let card = by_id(&doc, "card");

    session.on_hover(&mut doc, Some(hero));
    assert!(doc.tree().as_element(hero).unwrap().classes.contains("lp-hover"));

    session.on_hover(&mut doc, Some(card));
    assert!(!doc.tree().as_element(hero).unwrap().classes.contains("lp-hover"));
    assert!(doc.tree().as_element(card).unwrap().classes.contains("lp-hover"));

    session.on_hover(&mut doc, None);
    assert!(!doc.tree().as_element(card).unwrap().classes.contains("lp-hover"));
}

#[test]
fn test_hover_ignored_outside_selection_mode() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    let hero = by_id(&doc, "hero");
    session.on_hover(&mut doc, Some(hero));
    assert!(!doc.tree().as_element(hero).unwrap().classes.contains("lp-hover"));
}

#[test]
fn test_hover_cleared_when_leaving_selection_mode() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_hover(&mut doc, Some(hero));

    session.handle_message(&mut doc, PARENT, json!({"type": "ready"}));
    assert!(!doc.tree().as_element(hero).unwrap().classes.contains("lp-hover"));
}

#[test]
fn test_hovering_badge_chrome_does_not_highlight() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);
    session.run_frame(&mut doc).unwrap();

    let badge_node = session.overlay().badge_for(hero).unwrap().node;
    session.on_hover(&mut doc, Some(badge_node));
    assert!(!doc
        .tree()
        .as_element(badge_node)
        .unwrap()
        .classes
        .contains("lp-hover"));
}

// ============================================================================
// BADGE CHROME
// ============================================================================

#[test]
fn test_badge_close_removes_selection_in_any_state() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);
    session.run_frame(&mut doc).unwrap();
    session.take_outbound();

    let badge_node = session.overlay().badge_for(hero).unwrap().node;
    let close = doc
        .tree()
        .descendants(badge_node)
        .into_iter()
        .find(|&n| {
            doc.tree()
                .as_element(n)
                .is_some_and(|e| e.classes.contains("lp-badge-close"))
        })
        .expect("badge has a close affordance");

    assert!(session.on_click(&mut doc, close));
    assert!(session.store().is_empty());
    assert!(session.overlay().is_empty());

    let out = session.take_outbound();
    assert!(matches!(out[0].message, Outbound::ElementSelection(_)));
}

#[test]
fn test_click_on_badge_body_is_consumed_without_toggle() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);
    session.run_frame(&mut doc).unwrap();
    session.take_outbound();

    let badge_node = session.overlay().badge_for(hero).unwrap().node;
    assert!(session.on_click(&mut doc, badge_node));
    assert_eq!(session.store().len(), 1);
    assert!(session.take_outbound().is_empty());
}

#[test]
fn test_placeholder_badge_when_icons_fail() {
    let mut doc = page();
    let config = SessionConfig {
        allowed_origins: vec![PARENT.into()],
        ..SessionConfig::default()
    };
    let mut session = SelectSession::new(config, Box::new(NoIcons));
    session.start();
    session.handle_message(&mut doc, PARENT, json!({"type": "tool-element-selection"}));

    let hero = by_id(&doc, "hero");
    assert!(session.on_click(&mut doc, hero));
    session.run_frame(&mut doc).unwrap();

    // Icon failure degrades to a placeholder; selection state is untouched
    let badge = session.overlay().badge_for(hero).unwrap();
    assert!(!badge.icon_rendered);
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.state(), EditorState::ElementSelection);
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[test]
fn test_event_bursts_coalesce_into_one_pass() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);
    session.run_frame(&mut doc).unwrap();

    for _ in 0..20 {
        session.on_scroll();
        session.on_resize();
    }
    assert!(session.frame_requested());
    session.run_frame(&mut doc).unwrap();
    assert!(!session.frame_requested());

    // Nothing left pending: a further frame is a no-op
    session.run_frame(&mut doc).unwrap();
    assert!(!session.frame_requested());
}

#[test]
fn test_viewport_events_inert_before_first_badge() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);

    session.on_scroll();
    session.on_resize();
    assert!(!session.frame_requested());
    session.run_frame(&mut doc).unwrap();
}

#[test]
fn test_removed_before_frame_never_gets_a_badge() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    session.on_click(&mut doc, hero);

    let id = stable_id(&node_path(doc.tree(), hero).unwrap()).unwrap();
    session.handle_message(
        &mut doc,
        PARENT,
        json!({"type": "remove-selection", "payload": {"element": id}}),
    );

    session.run_frame(&mut doc).unwrap();
    assert!(session.overlay().is_empty());
    assert!(!doc
        .tree()
        .as_element(hero)
        .unwrap()
        .classes
        .contains("lp-selected"));
}

// ============================================================================
// PASSTHROUGH BEHAVIOR
// ============================================================================

#[test]
fn test_clicks_pass_through_outside_selection_mode() {
    let mut doc = page();
    let mut session = session();
    session.take_outbound();

    let hero = by_id(&doc, "hero");
    assert!(!session.on_click(&mut doc, hero));
    assert!(session.store().is_empty());
}

#[test]
fn test_non_element_click_not_consumed() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);

    let hero = by_id(&doc, "hero");
    let text = doc.tree().children(hero).next().expect("text child");
    assert!(doc.tree().as_element(text).is_none());
    assert!(!session.on_click(&mut doc, text));
    assert!(session.store().is_empty());
}

#[test]
fn test_clear_selection_is_bulk_and_silent() {
    let mut doc = page();
    let mut session = selecting_session(&mut doc);
    let hero = by_id(&doc, "hero");
    let card = by_id(&doc, "card");
    session.on_click(&mut doc, hero);
    session.on_click(&mut doc, card);
    session.run_frame(&mut doc).unwrap();
    session.take_outbound();

    session.handle_message(&mut doc, PARENT, json!({"type": "clear-selection"}));

    assert!(session.store().is_empty());
    assert!(session.overlay().is_empty());
    // State is untouched by clear
    assert_eq!(session.state(), EditorState::ElementSelection);

    // Only the ack and one status; no per-entry notifications
    let out = session.take_outbound();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].message, Outbound::status("selection-cleared"));
}
