//! # omniview
//!
//! A universal content renderer: raw strings go in together with a format
//! tag, and something displayable comes out.
//!
//! ## Formats
//!
//! - **text**: shown as-is
//! - **html**: passed through, sanitized when it leaves the component
//! - **markdown**: CommonMark (with tables, strikethrough and task lists) to HTML
//! - **latex**: documents and fragments to HTML with MathML math; failures
//!   become an escaped error panel instead of an error
//! - **mathjax**: left untouched for a client-side typesetter
//! - **json**: parsed into a value tree for the collapsible viewer
//! - **code**: placeholder for now
//!
//! Every renderer is total. Empty input gives an empty result, an unknown
//! format name passes the input through, and malformed content comes back as
//! a [`RenderResult::Error`] or an error fragment rather than an `Err`.
//!
//! ## Quick Start
//!
//! ```rust
//! use omniview::{render, Format, Omniview, RenderResult};
//!
//! // Dispatch directly.
//! let result = render(Format::Json, r#"{"a": 1}"#);
//! assert!(matches!(result, RenderResult::Tree(_)));
//!
//! // Or go through the display component for sanitized HTML.
//! let html = Omniview::new("**bold**", Format::Markdown).to_html();
//! assert!(html.contains("<strong>bold</strong>"));
//! ```
//!
//! ## Configuration (TOML)
//!
//! ```text
//! default_format = "markdown"
//!
//! [markdown]
//! footnotes = true
//!
//! [latex]
//! mode = "document"     # or "element" for the <latex-js> web component
//! extra_packages = ["xcolor"]
//!
//! [mathjax]
//! inline_math = [["$", "$"], ["\\(", "\\)"]]
//! ```

pub mod assets;
pub mod component;
pub mod config;
pub mod error;
pub mod format;
pub mod render;
pub mod viewer;

// FFI module (compiled for native cdylib/staticlib targets)
#[cfg(not(target_arch = "wasm32"))]
pub mod ffi;

// WASM module (only with feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Convenience re-exports
pub use component::{DefaultSanitizer, NoSanitizer, Omniview, Sanitizer, View};
pub use config::OmniviewConfig;
pub use error::{Error, Result};
pub use format::Format;
pub use render::{render, render_named, RenderFailure, RenderResult, Registry, Renderer};
pub use viewer::JsonViewer;

/// Render `data` as `format` into a sanitized HTML fragment.
///
/// # Example
///
/// ```rust
/// use omniview::{render_to_html, Format};
///
/// let html = render_to_html("<p onclick=\"x()\">Hi</p>", Format::Html);
/// assert_eq!(html, "<div class=\"omniview-content\"><p>Hi</p></div>");
/// ```
pub fn render_to_html(data: &str, format: Format) -> String {
    Omniview::new(data, format).to_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_renders_to_html() {
        for format in Format::ALL {
            let html = render_to_html("x", format);
            assert!(html.starts_with("<div class=\"omniview-content\">"), "{}", format);
        }
    }

    #[test]
    fn test_markdown_features() {
        let html = render_to_html("| a |\n|---|\n| b |\n\n~~gone~~\n\n- [x] done", Format::Markdown);
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_latex_document() {
        let input = r#"\documentclass{article}
\title{Notes}
\begin{document}
\maketitle
\section{Intro}
Euler: \[ e^{i\pi} + 1 = 0 \]
\end{document}"#;
        let html = render_to_html(input, Format::Latex);
        assert!(html.contains("latex-output"));
        assert!(html.contains("Intro"));
        assert!(html.contains("<math"));
        assert!(!html.contains("latex-error"));
    }

    #[test]
    fn test_empty_input_for_every_format() {
        for format in Format::ALL {
            assert!(render(format, "").is_empty(), "{}", format);
        }
    }

    #[test]
    fn test_identity_formats() {
        for s in ["plain", "<b>bold</b>", "$x^2$ and $$\\int f$$", "\\(a\\) \\[b\\]"] {
            assert_eq!(render(Format::Text, s), RenderResult::Text(s.into()));
            assert_eq!(render(Format::Html, s), RenderResult::Markup(s.into()));
            assert_eq!(render(Format::Mathjax, s), RenderResult::Text(s.into()));
            assert_eq!(render_named("not-a-format", s), RenderResult::Text(s.into()));
        }
    }

    #[test]
    fn test_json_values_and_errors() {
        assert_eq!(
            render(Format::Json, r#"{"a":1}"#),
            RenderResult::Tree(serde_json::json!({"a": 1}))
        );
        let failure = render(Format::Json, "{bad}");
        let failure = failure.as_failure().unwrap();
        assert_eq!(failure.message, "Invalid JSON");
        assert_eq!(failure.raw.as_deref(), Some("{bad}"));
    }

    #[test]
    fn test_latex_unsupported_environment_is_escaped() {
        let input = "\\begin{document}\\begin{tikzcd}A <-> B\\end{tikzcd}\\end{document}";
        let html = render(Format::Latex, input);
        let html = html.as_str().unwrap();
        assert!(html.contains("unknown environment: tikzcd"));
        assert!(html.contains("A &lt;-&gt; B"));
        assert!(!html.contains("A <-> B"));
    }

    #[test]
    fn test_json_viewer_toggle_round_trip() {
        let RenderResult::Tree(value) = render(Format::Json, r#"{"o": {"k": true}}"#) else {
            panic!("expected tree");
        };
        let mut viewer = JsonViewer::new(value);
        let before = viewer.to_html();
        viewer.toggle("o");
        assert_ne!(viewer.to_html(), before);
        viewer.toggle("o");
        assert_eq!(viewer.to_html(), before);
    }

    #[test]
    fn test_config_from_toml_drives_component() {
        let config = OmniviewConfig::from_toml_str("default_format = \"json\"").unwrap();
        let view = Omniview::builder().data("[1, 2]").config(config).build();
        assert!(matches!(view.view(), View::Json(_)));
    }
}
