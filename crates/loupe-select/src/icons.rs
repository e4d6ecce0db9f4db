//! Tag categories and icon capability
//!
//! The badge renderer needs two collaborators: a pure tag→category mapping
//! and an icon-rendering capability that is loaded at most once per session.
//! Icon loading can fail (it is a third-party script in the original
//! deployment); failure is never fatal and downgrades badges to a text
//! placeholder.

/// Category label for a tag name
///
/// Total function: unrecognized tags fall back to `"block"`.
pub fn category_for_tag(tag: &str) -> &'static str {
    match tag.to_lowercase().as_str() {
        "a" => "link",
        "button" => "action",
        "input" | "select" | "textarea" | "option" | "label" | "form" | "fieldset" => "form",
        "img" | "picture" | "svg" | "canvas" | "video" | "audio" | "figure" => "media",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "p" | "span" | "em" | "strong" | "blockquote" | "pre" | "code" => "text",
        "ul" | "ol" | "li" | "dl" | "dt" | "dd" => "list",
        "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" | "caption" => "table",
        "nav" | "header" | "footer" | "main" | "aside" | "section" | "article" => "landmark",
        _ => "block",
    }
}

/// Icon load error
#[derive(Debug, Clone, thiserror::Error)]
pub enum IconError {
    #[error("icon capability failed to load: {0}")]
    Load(String),
}

/// Loaded icon-rendering capability
///
/// `render_all` is idempotent; the session calls it after every badge batch.
pub trait IconCapability {
    fn render_all(&mut self);
}

/// Icon capability source, loaded at most once per session
pub trait IconProvider {
    fn load(&mut self) -> Result<Box<dyn IconCapability>, IconError>;
}

/// Provider for hosts with no icon library; badges keep the text placeholder
#[derive(Debug, Default)]
pub struct NoIcons;

impl IconProvider for NoIcons {
    fn load(&mut self) -> Result<Box<dyn IconCapability>, IconError> {
        Err(IconError::Load("no icon capability configured".into()))
    }
}

enum LoadState {
    Idle,
    Ready(Box<dyn IconCapability>),
    Failed,
}

/// Single-flight wrapper around an `IconProvider`
///
/// The provider runs at most once; every later request shares the cached
/// outcome. A failed load is remembered and reported as the placeholder
/// outcome from then on.
pub struct IconLoader {
    provider: Box<dyn IconProvider>,
    state: LoadState,
}

impl IconLoader {
    pub fn new(provider: Box<dyn IconProvider>) -> Self {
        Self {
            provider,
            state: LoadState::Idle,
        }
    }

    /// Whether the one-time load has failed
    pub fn failed(&self) -> bool {
        matches!(self.state, LoadState::Failed)
    }

    /// Ensure the capability is loaded; returns it, or None for placeholder
    pub fn ensure_loaded(&mut self) -> Option<&mut dyn IconCapability> {
        if matches!(self.state, LoadState::Idle) {
            self.state = match self.provider.load() {
                Ok(capability) => LoadState::Ready(capability),
                Err(err) => {
                    tracing::warn!("icon load failed, using text placeholders: {err}");
                    LoadState::Failed
                }
            };
        }
        match &mut self.state {
            LoadState::Ready(capability) => Some(capability.as_mut()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for IconLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            LoadState::Idle => "idle",
            LoadState::Ready(_) => "ready",
            LoadState::Failed => "failed",
        };
        f.debug_struct("IconLoader").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingCapability {
        renders: Rc<Cell<u32>>,
    }

    impl IconCapability for CountingCapability {
        fn render_all(&mut self) {
            self.renders.set(self.renders.get() + 1);
        }
    }

    struct CountingProvider {
        loads: Rc<Cell<u32>>,
        renders: Rc<Cell<u32>>,
        fail: bool,
    }

    impl IconProvider for CountingProvider {
        fn load(&mut self) -> Result<Box<dyn IconCapability>, IconError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail {
                return Err(IconError::Load("network unreachable".into()));
            }
            Ok(Box::new(CountingCapability {
                renders: self.renders.clone(),
            }))
        }
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(category_for_tag("A"), "link");
        assert_eq!(category_for_tag("h2"), "heading");
        assert_eq!(category_for_tag("custom-widget"), "block");
    }

    #[test]
    fn test_load_happens_once() {
        let loads = Rc::new(Cell::new(0));
        let renders = Rc::new(Cell::new(0));
        let mut loader = IconLoader::new(Box::new(CountingProvider {
            loads: loads.clone(),
            renders: renders.clone(),
            fail: false,
        }));

        for _ in 0..3 {
            loader.ensure_loaded().unwrap().render_all();
        }
        assert_eq!(loads.get(), 1);
        assert_eq!(renders.get(), 3);
    }

    #[test]
    fn test_failure_is_sticky_and_nonfatal() {
        let loads = Rc::new(Cell::new(0));
        let mut loader = IconLoader::new(Box::new(CountingProvider {
            loads: loads.clone(),
            renders: Rc::new(Cell::new(0)),
            fail: true,
        }));

        assert!(loader.ensure_loaded().is_none());
        assert!(loader.ensure_loaded().is_none());
        assert_eq!(loads.get(), 1);
        assert!(loader.failed());
    }

    #[test]
    fn test_no_icons_provider() {
        let mut loader = IconLoader::new(Box::new(NoIcons));
        assert!(loader.ensure_loaded().is_none());
    }
}
