//! Parent message protocol
//!
//! Cross-document messages between the embedded session and its parent.
//! Inbound envelopes are validated at the boundary into a closed `Command`
//! type; outbound messages serialize to the wire shapes the parent expects.
//! The first message from an allow-listed origin pins that origin for the
//! rest of the session; there is deliberately no error-response type, so
//! rejected or malformed traffic surfaces only as silence.

use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

/// Inbound command, validated at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave selection mode and clear state
    Ready,
    /// Enter element-selection mode
    SelectionTool,
    /// Drop every selection, keep the current mode
    ClearSelection,
    /// Drop one selection by stable identifier
    RemoveSelection { element: String },
    /// Reconstruct a selection from stable identifiers alone
    RebuildSelection { ids: Vec<String> },
    /// Anything unrecognized or malformed; acknowledged, then ignored
    Unknown(String),
}

impl Command {
    /// Validate a raw envelope into a command
    ///
    /// A missing or malformed required payload field downgrades the message
    /// to `Unknown`. The exception is `rebuild-selection`: a missing or
    /// non-array id list means an empty rebuild.
    pub fn parse(message: &Value) -> Command {
        let ty = message.get("type").and_then(Value::as_str).unwrap_or_default();
        let payload = message.get("payload");

        match ty {
            "ready" => Command::Ready,
            "tool-element-selection" => Command::SelectionTool,
            "clear-selection" => Command::ClearSelection,
            "remove-selection" => {
                match payload.and_then(|p| p.get("element")).and_then(Value::as_str) {
                    Some(id) => Command::RemoveSelection {
                        element: id.to_string(),
                    },
                    None => Command::Unknown(ty.to_string()),
                }
            }
            "rebuild-selection" => {
                let ids = payload
                    .and_then(|p| p.get("ids"))
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Command::RebuildSelection { ids }
            }
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// One element in a selection-changed payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedElement {
    pub id: String,
    pub tag_name: String,
    pub xpath: String,
}

/// Payload of `element-selection`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChanged {
    pub selected_elements: Vec<SelectedElement>,
    pub selected_element_ids: Vec<String>,
    /// Identifier of the entry that changed (added or removed)
    pub element_id: String,
    #[serde(rename = "elementXPath")]
    pub element_xpath: String,
}

/// One element in a rebuild report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuiltElement {
    pub id: String,
    pub xpath: String,
}

/// Payload of `selection-rebuilt`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub selected_elements: Vec<RebuiltElement>,
    pub selected_element_ids: Vec<String>,
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Outbound {
    /// Unconditional receipt echo, sent before dispatch
    Ack { message: Value },
    /// State name or free-text progress line
    Status { status: String },
    /// The selection changed by one entry
    ElementSelection(SelectionChanged),
    /// Result of a rebuild request, matched entries only
    SelectionRebuilt(RebuildReport),
}

impl Outbound {
    /// Status message helper
    pub fn status(text: &str) -> Outbound {
        Outbound::Status {
            status: text.to_string(),
        }
    }
}

/// Outbound delivery target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The pinned parent origin
    Origin(String),
    /// Permissive wildcard, used only for the bootstrap ready announcement
    Any,
}

impl Target {
    /// Wire form of the target ("*" for the wildcard)
    pub fn as_str(&self) -> &str {
        match self {
            Target::Origin(origin) => origin,
            Target::Any => "*",
        }
    }
}

/// A queued outbound message with its target
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEnvelope {
    pub target: Target,
    pub message: Outbound,
}

/// Outbound queue, drained by the host into the real message channel
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<OutboundEnvelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message
    pub fn push(&mut self, target: Target, message: Outbound) {
        self.queue.push_back(OutboundEnvelope { target, message });
    }

    /// Take every queued message, oldest first
    pub fn drain(&mut self) -> Vec<OutboundEnvelope> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Validates senders against the allow-list and pins the first trusted origin
#[derive(Debug)]
pub struct ParentGateway {
    allowed: Vec<String>,
    pinned: Option<String>,
}

impl ParentGateway {
    /// Create a gateway with a fixed origin allow-list
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed,
            pinned: None,
        }
    }

    /// Check a sender origin; pins it if it is the first trusted one
    ///
    /// Returns false for origins outside the allow-list: the message must be
    /// dropped with no acknowledgment and no state change.
    pub fn admit(&mut self, origin: &str) -> bool {
        let trusted = self
            .allowed
            .iter()
            .any(|entry| entry == "*" || entry == origin);
        if !trusted {
            tracing::warn!("rejected message from untrusted origin: {origin}");
            return false;
        }
        if self.pinned.is_none() {
            tracing::debug!("pinned parent origin: {origin}");
            self.pinned = Some(origin.to_string());
        }
        true
    }

    /// The pinned parent origin, if any message has been accepted yet
    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    /// Queue a message for the pinned origin; dropped silently when unpinned
    pub fn deliver(&self, outbox: &mut Outbox, message: Outbound) {
        match &self.pinned {
            Some(origin) => outbox.push(Target::Origin(origin.clone()), message),
            None => tracing::debug!("no parent origin pinned; outbound message dropped"),
        }
    }

    /// Queue a wildcard broadcast (bootstrap announcement only)
    pub fn broadcast(&self, outbox: &mut Outbox, message: Outbound) {
        outbox.push(Target::Any, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&json!({"type": "ready"})), Command::Ready);
        assert_eq!(
            Command::parse(&json!({"type": "tool-element-selection"})),
            Command::SelectionTool
        );
        assert_eq!(
            Command::parse(&json!({"type": "clear-selection"})),
            Command::ClearSelection
        );
        assert_eq!(
            Command::parse(&json!({"type": "remove-selection", "payload": {"element": "a1b2c3"}})),
            Command::RemoveSelection {
                element: "a1b2c3".into()
            }
        );
        assert_eq!(
            Command::parse(&json!({"type": "rebuild-selection", "payload": {"ids": ["x", "y"]}})),
            Command::RebuildSelection {
                ids: vec!["x".into(), "y".into()]
            }
        );
    }

    #[test]
    fn test_parse_degraded_payloads() {
        // Missing ids list is an empty rebuild
        assert_eq!(
            Command::parse(&json!({"type": "rebuild-selection"})),
            Command::RebuildSelection { ids: vec![] }
        );
        assert_eq!(
            Command::parse(&json!({"type": "rebuild-selection", "payload": {"ids": "nope"}})),
            Command::RebuildSelection { ids: vec![] }
        );
        // Missing element id is not a valid removal
        assert_eq!(
            Command::parse(&json!({"type": "remove-selection"})),
            Command::Unknown("remove-selection".into())
        );
        assert_eq!(
            Command::parse(&json!({"type": "mystery"})),
            Command::Unknown("mystery".into())
        );
        assert_eq!(Command::parse(&json!({"no": "type"})), Command::Unknown(String::new()));
    }

    #[test]
    fn test_outbound_wire_shapes() {
        let ack = Outbound::Ack {
            message: json!({"type": "ready"}),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"type": "ack", "payload": {"message": {"type": "ready"}}})
        );

        let status = Outbound::status("element-selection");
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"type": "status", "payload": {"status": "element-selection"}})
        );

        let changed = Outbound::ElementSelection(SelectionChanged {
            selected_elements: vec![SelectedElement {
                id: "a1b2c3".into(),
                tag_name: "div".into(),
                xpath: "/html[1]/body[1]/div[1]".into(),
            }],
            selected_element_ids: vec!["a1b2c3".into()],
            element_id: "a1b2c3".into(),
            element_xpath: "/html[1]/body[1]/div[1]".into(),
        });
        assert_eq!(
            serde_json::to_value(&changed).unwrap(),
            json!({
                "type": "element-selection",
                "payload": {
                    "selectedElements": [
                        {"id": "a1b2c3", "tagName": "div", "xpath": "/html[1]/body[1]/div[1]"}
                    ],
                    "selectedElementIds": ["a1b2c3"],
                    "elementId": "a1b2c3",
                    "elementXPath": "/html[1]/body[1]/div[1]"
                }
            })
        );

        let rebuilt = Outbound::SelectionRebuilt(RebuildReport {
            selected_elements: vec![],
            selected_element_ids: vec![],
        });
        assert_eq!(
            serde_json::to_value(&rebuilt).unwrap(),
            json!({
                "type": "selection-rebuilt",
                "payload": {"selectedElements": [], "selectedElementIds": []}
            })
        );
    }

    #[test]
    fn test_gateway_pins_first_trusted_origin() {
        let mut gateway = ParentGateway::new(vec!["https://studio.example".into()]);
        assert!(gateway.pinned().is_none());

        assert!(!gateway.admit("https://evil.example"));
        assert!(gateway.pinned().is_none());

        assert!(gateway.admit("https://studio.example"));
        assert_eq!(gateway.pinned(), Some("https://studio.example"));
    }

    #[test]
    fn test_gateway_wildcard_entry() {
        let mut gateway = ParentGateway::new(vec!["*".into()]);
        assert!(gateway.admit("https://anything.example"));
        assert_eq!(gateway.pinned(), Some("https://anything.example"));
    }

    #[test]
    fn test_deliver_requires_pin() {
        let gateway = ParentGateway::new(vec!["https://studio.example".into()]);
        let mut outbox = Outbox::new();

        gateway.deliver(&mut outbox, Outbound::status("ready"));
        assert!(outbox.is_empty());

        gateway.broadcast(&mut outbox, Outbound::status("ready"));
        let queued = outbox.drain();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].target, Target::Any);
    }
}
