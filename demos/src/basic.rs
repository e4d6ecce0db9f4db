//! Example: a scripted parent conversation with the selection overlay
//!
//! Plays both sides of the message channel: the parent switches on the
//! selection tool, the "user" clicks two elements and scrolls, the page
//! reloads, and the parent reconstructs the selection from stable ids.

use anyhow::Result;
use loupe_dom::{Document, NodeId, Rect};
use loupe_html::HtmlLoader;
use loupe_select::{IconCapability, IconError, IconProvider, SelectSession, SessionConfig};
use serde_json::json;

const PARENT_ORIGIN: &str = "https://studio.example";

const PAGE: &str = "<html><body>\
    <h1 id=\"title\">Demo page</h1>\
    <div id=\"hero\">Above the fold</div>\
    <div id=\"card\">A content card</div>\
    <p id=\"footnote\">Small print</p>\
    </body></html>";

struct DemoIcons;

impl IconProvider for DemoIcons {
    fn load(&mut self) -> Result<Box<dyn IconCapability>, IconError> {
        struct Caps;
        impl IconCapability for Caps {
            fn render_all(&mut self) {
                // A real deployment swaps icon placeholders for glyphs here.
            }
        }
        Ok(Box::new(Caps))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut doc = load_page()?;
    let mut session = new_session();
    session.start();
    drain("boot", &mut session)?;

    // Parent switches on the selection tool
    session.handle_message(
        &mut doc,
        PARENT_ORIGIN,
        json!({"type": "tool-element-selection"}),
    );
    drain("tool", &mut session)?;

    // User picks two elements; badges land on the next frame
    let hero = by_id(&doc, "hero");
    let card = by_id(&doc, "card");
    session.on_click(&mut doc, hero);
    session.on_click(&mut doc, card);
    session.run_frame(&mut doc)?;
    drain("clicks", &mut session)?;

    // Scrolling keeps badges glued to their targets
    doc.scroll_by(0.0, 200.0);
    session.on_scroll();
    session.run_frame(&mut doc)?;
    for entry in session.store().iter() {
        let badge = session.overlay().badge_for(entry.node).expect("badge exists");
        println!(
            "badge {} at ({}, {}) after scroll",
            entry.id, badge.rect.x, badge.rect.y
        );
    }

    // The page reloads: only the stable ids survive the boundary
    let ids = session.store().ids();
    println!("reloading; parent kept ids {ids:?}");

    let mut doc = load_page()?;
    let mut session = new_session();
    session.start();
    drain("boot", &mut session)?;
    session.handle_message(
        &mut doc,
        PARENT_ORIGIN,
        json!({"type": "rebuild-selection", "payload": {"ids": ids}}),
    );
    session.run_frame(&mut doc)?;
    drain("rebuild", &mut session)?;

    println!(
        "restored {} of {} selections",
        session.store().len(),
        2
    );
    Ok(())
}

fn new_session() -> SelectSession {
    let config = SessionConfig {
        allowed_origins: vec![PARENT_ORIGIN.into()],
        ..SessionConfig::default()
    };
    SelectSession::new(config, Box::new(DemoIcons))
}

fn load_page() -> Result<Document> {
    let mut doc = HtmlLoader::new().parse_with_url(PAGE, "https://app.example/embed")?;

    // Stand-in for layout: stack every element in a vertical flow
    let root = doc.tree().root();
    let mut y = 80.0;
    for id in doc.tree().descendants(root) {
        if doc.tree().as_element(id).is_some() {
            doc.tree_mut()
                .set_layout_rect(id, Rect::from_xywh(20.0, y, 360.0, 48.0))?;
            y += 60.0;
        }
    }
    Ok(doc)
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
        .expect("demo page contains the element")
}

fn drain(stage: &str, session: &mut SelectSession) -> Result<()> {
    for envelope in session.take_outbound() {
        println!(
            "[{stage}] -> {}: {}",
            envelope.target.as_str(),
            serde_json::to_string(&envelope.message)?
        );
    }
    Ok(())
}
