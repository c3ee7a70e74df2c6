//! Placeholder for formats without a renderer yet.

use super::RenderResult;
use crate::format::Format;

/// Announce that `format` is not rendered yet, followed by the raw input.
pub fn placeholder(format: Format, data: &str) -> RenderResult {
    RenderResult::Text(format!("[{} rendering - coming soon]\n\n{}", format, data))
}

/// Renderer registered for [`Format::Code`].
pub fn render_code(data: &str) -> RenderResult {
    placeholder(Format::Code, data)
}
