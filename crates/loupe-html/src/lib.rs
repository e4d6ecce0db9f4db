//! loupe HTML - Markup loader
//!
//! Parses HTML text into a `loupe_dom::Document` so demos and tests can
//! build realistic embedded documents.

mod parser;

pub use parser::HtmlLoader;

/// HTML load error
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read markup: {0}")]
    Io(#[from] std::io::Error),

    #[error("dom construction failed: {0}")]
    Dom(#[from] loupe_dom::DomError),
}
