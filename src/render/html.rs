//! HTML renderer.
//!
//! The markup is returned untouched. Script elements, inline event handlers
//! and `javascript:` URLs are removed where the markup is bound for display,
//! by the component's [`Sanitizer`](crate::component::Sanitizer).

use super::RenderResult;

pub fn render_html(data: &str) -> RenderResult {
    RenderResult::Markup(data.to_string())
}
