//! Format-specific renderers and the registry that dispatches to them.

pub mod html;
pub mod json;
pub mod latex;
pub mod markdown;
pub mod mathjax;
pub mod placeholder;
mod registry;
pub mod text;

pub use registry::{default_registry, render, render_named, Registry};

use serde::Serialize;
use serde_json::Value;

/// The value a renderer produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RenderResult {
    /// A display string shown verbatim.
    Text(String),
    /// HTML markup, to be sanitized by the binding layer before insertion.
    Markup(String),
    /// A parsed value for the structured viewer.
    Tree(Value),
    /// A caught failure, carrying the offending input.
    Error(RenderFailure),
}

/// A failure caught at an adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFailure {
    pub message: String,
    pub raw: Option<String>,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>, raw: Option<&str>) -> Self {
        Self {
            message: message.into(),
            raw: raw.map(String::from),
        }
    }
}

impl RenderResult {
    /// The empty display value.
    pub fn empty() -> Self {
        RenderResult::Text(String::new())
    }

    /// Whether this is the empty display value.
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderResult::Text(s) if s.is_empty())
    }

    /// The string payload of a text or markup result.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RenderResult::Text(s) | RenderResult::Markup(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Value> {
        match self {
            RenderResult::Tree(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&RenderFailure> {
        match self {
            RenderResult::Error(f) => Some(f),
            _ => None,
        }
    }
}

/// A renderer: a total function from content to a displayable value.
///
/// Implementations must not panic on any input; conversion failures are
/// returned as [`RenderResult::Error`] or as markup describing the error.
pub trait Renderer: Send + Sync {
    fn render(&self, data: &str) -> RenderResult;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> RenderResult + Send + Sync,
{
    fn render(&self, data: &str) -> RenderResult {
        self(data)
    }
}

/// Escape HTML special characters in text content.
pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a value for use inside a double-quoted attribute.
pub(crate) fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}
