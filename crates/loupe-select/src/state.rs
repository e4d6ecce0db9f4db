//! Editor state
//!
//! Lifecycle state gating the interaction listeners and cursor styling.
//! Transitions are applied by the session per parent command; they are
//! cyclic, with no terminal state.

/// Editor lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorState {
    /// Session constructed, listeners not yet attached
    #[default]
    Initializing,
    /// Idle; clicks and hovers pass through untouched
    Ready,
    /// Selection mode; pointer events are intercepted
    ElementSelection,
}

impl EditorState {
    /// Protocol name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::ElementSelection => "element-selection",
        }
    }

    /// Whether interaction listeners intercept pointer events
    pub fn selecting(self) -> bool {
        matches!(self, Self::ElementSelection)
    }
}

impl std::fmt::Display for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
