//! Plain text renderer.

use super::RenderResult;

/// Identity: the input is shown unchanged.
pub fn render_text(data: &str) -> RenderResult {
    RenderResult::Text(data.to_string())
}
