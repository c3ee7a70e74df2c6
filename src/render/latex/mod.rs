//! LaTeX renderer.
//!
//! Rendering runs in three steps: math delimiters are normalised to the
//! `$`/`$$` pair the converter expects, the source goes through a
//! [`LatexConverter`], and the converter's stylesheet and body are combined
//! into one fragment. Conversion failures never escape: they come back as an
//! escaped `latex-error` fragment showing the message and the raw source.

mod article;
pub mod lexer;
pub mod preprocess;

pub use article::ArticleConverter;
pub use preprocess::normalize_math;

use super::{escape_html, RenderFailure, RenderResult, Renderer};
use crate::config::{LatexConfig, LatexMode};
use crate::error::LatexError;
use tracing::warn;

/// Options passed to the conversion capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatexOptions {
    /// Allow the browser to hyphenate paragraphs.
    pub hyphenate: bool,
    /// Stylesheet linked from the generated head.
    pub stylesheet_url: Option<String>,
}

/// Output of a conversion: head markup (styles, links) and body markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    pub head: String,
    pub body: String,
}

/// A LaTeX-to-HTML conversion capability.
pub trait LatexConverter: Send + Sync {
    fn convert(&self, source: &str, options: &LatexOptions) -> Result<Converted, LatexError>;
}

/// Convert `data`, returning the combined fragment or the caught failure.
///
/// Blank input yields an empty string without invoking the converter.
pub fn try_render_latex(
    converter: &dyn LatexConverter,
    options: &LatexOptions,
    data: &str,
) -> Result<String, RenderFailure> {
    if data.trim().is_empty() {
        return Ok(String::new());
    }

    let source = normalize_math(data);
    match converter.convert(&source, options) {
        Ok(converted) => Ok(format!(
            r#"<div class="latex-output"><style>{}</style><div class="latex-content">{}</div></div>"#,
            extract_styles(&converted.head),
            converted.body
        )),
        Err(e) => {
            warn!(error = %e, "LaTeX conversion failed");
            Err(RenderFailure::new(e.to_string(), Some(data)))
        }
    }
}

/// Convert `data` to markup; failures become an error fragment.
pub fn render_latex(
    converter: &dyn LatexConverter,
    options: &LatexOptions,
    data: &str,
) -> RenderResult {
    match try_render_latex(converter, options, data) {
        Ok(html) if html.is_empty() => RenderResult::empty(),
        Ok(html) => RenderResult::Markup(html),
        Err(failure) => RenderResult::Markup(error_fragment(&failure)),
    }
}

/// Wrap the raw source in a `<latex-js>` element for the browser component.
pub fn render_latex_element(data: &str, hyphenate: bool) -> RenderResult {
    if data.trim().is_empty() {
        return RenderResult::empty();
    }
    RenderResult::Markup(format!(
        r#"<latex-js hyphenate="{}">{}</latex-js>"#,
        hyphenate,
        escape_html(data)
    ))
}

/// Concatenate the contents of every `<style>` element in `head`.
pub fn extract_styles(head: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `head`.
    let lower = head.to_ascii_lowercase();
    let mut styles = Vec::new();
    let mut pos = 0;

    while let Some(open) = lower[pos..].find("<style") {
        let open = pos + open;
        let Some(tag_end) = lower[open..].find('>') else {
            break;
        };
        let content_start = open + tag_end + 1;
        let Some(close) = lower[content_start..].find("</style>") else {
            break;
        };
        styles.push(&head[content_start..content_start + close]);
        pos = content_start + close + "</style>".len();
    }

    styles.join("\n")
}

/// The escaped error fragment shown in place of a failed conversion.
pub fn error_fragment(failure: &RenderFailure) -> String {
    format!(
        r#"<div class="latex-error">
  <div class="latex-error-header">
    <strong>LaTeX Rendering Error</strong>
  </div>
  <div class="latex-error-message">
    <p>{message}</p>
    <p><em>This may be due to unsupported LaTeX packages or features (e.g., TikZ, PGF).</em></p>
  </div>
  <details class="latex-error-details">
    <summary>Show raw LaTeX source</summary>
    <pre class="latex-error-source">{source}</pre>
  </details>
</div>"#,
        message = escape_html(&failure.message),
        source = escape_html(failure.raw.as_deref().unwrap_or_default()),
    )
}

/// The registered renderer for the `latex` format.
pub struct LatexRenderer {
    mode: LatexMode,
    converter: Box<dyn LatexConverter>,
    options: LatexOptions,
}

impl LatexRenderer {
    pub fn new(converter: Box<dyn LatexConverter>, options: LatexOptions) -> Self {
        Self {
            mode: LatexMode::Document,
            converter,
            options,
        }
    }

    /// Build the renderer described by `config`, converting with
    /// [`ArticleConverter`].
    pub fn from_config(config: &LatexConfig, stylesheet_url: Option<String>) -> Self {
        let converter = ArticleConverter::with_packages(config.extra_packages.iter().cloned());
        let options = LatexOptions {
            hyphenate: config.hyphenate,
            stylesheet_url,
        };
        Self {
            mode: config.mode,
            converter: Box::new(converter),
            options,
        }
    }

    pub fn mode(&self) -> LatexMode {
        self.mode
    }
}

impl Default for LatexRenderer {
    fn default() -> Self {
        Self::from_config(&LatexConfig::default(), None)
    }
}

impl Renderer for LatexRenderer {
    fn render(&self, data: &str) -> RenderResult {
        match self.mode {
            LatexMode::Document => render_latex(self.converter.as_ref(), &self.options, data),
            LatexMode::Element => render_latex_element(data, self.options.hyphenate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\\documentclass{article}\n\\begin{document}\nHello, \\(x^2\\).\n\\end{document}";

    const TIKZ: &str = r#"\documentclass{article}
\usepackage{tikz}
\begin{document}
\begin{tikzpicture}<a & b>\end{tikzpicture}
\end{document}"#;

    #[test]
    fn test_well_formed_document() {
        let result = LatexRenderer::default().render(MINIMAL);
        let html = result.as_str().unwrap();
        assert!(html.starts_with(r#"<div class="latex-output"><style>"#));
        assert!(html.contains(r#"<div class="latex-content"><p>Hello,"#));
        assert!(html.contains("<math"));
        assert!(!html.contains("latex-error"));
    }

    #[test]
    fn test_unsupported_package_fragment() {
        let result = LatexRenderer::default().render(TIKZ);
        let html = result.as_str().unwrap();
        assert!(html.contains(r#"<div class="latex-error">"#));
        assert!(html.contains("package not supported: tikz"));
        assert!(html.contains("\\usepackage{tikz}"));
        assert!(html.contains("&lt;a &amp; b&gt;"));
        assert!(!html.contains("<a & b>"));
    }

    #[test]
    fn test_structured_failure() {
        let failure = try_render_latex(&ArticleConverter::new(), &LatexOptions::default(), TIKZ)
            .unwrap_err();
        assert_eq!(failure.message, "package not supported: tikz");
        assert_eq!(failure.raw.as_deref(), Some(TIKZ));
    }

    #[test]
    fn test_message_is_escaped() {
        let failure = RenderFailure::new("bad <script>", Some("x"));
        let html = error_fragment(&failure);
        assert!(html.contains("bad &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_blank_input() {
        assert!(LatexRenderer::default().render("  \n ").is_empty());
    }

    #[test]
    fn test_environments_normalised_before_conversion() {
        let source = "\\begin{align}a &= b \\label{eq:1}\\\\ c &= d\\end{align}";
        let html = LatexRenderer::default().render(source);
        let html = html.as_str().unwrap();
        assert_eq!(html.matches("display=\"block\"").count(), 2);
    }

    #[test]
    fn test_verbatim_keeps_math_delimiters() {
        let result = LatexRenderer::default().render("\\begin{verbatim}\\(x\\)\\end{verbatim}");
        let html = result.as_str().unwrap();
        assert!(html.contains("<pre class=\"verbatim\">\\(x\\)</pre>"));
    }

    #[test]
    fn test_deep_nesting_becomes_error_fragment() {
        let source = format!("{}x{}", "{".repeat(10_000), "}".repeat(10_000));
        let result = LatexRenderer::default().render(&source);
        let html = result.as_str().unwrap();
        assert!(html.contains(r#"<div class="latex-error">"#));
        assert!(html.contains("nesting deeper than 128 levels"));
    }

    #[test]
    fn test_custom_converter() {
        struct Fixed;
        impl LatexConverter for Fixed {
            fn convert(&self, source: &str, _: &LatexOptions) -> Result<Converted, LatexError> {
                Ok(Converted {
                    head: "<link rel=\"x\"><STYLE type=\"text/css\">p{}</STYLE><style>b{}</style>"
                        .into(),
                    body: format!("<p>{}</p>", source),
                })
            }
        }
        let html = try_render_latex(&Fixed, &LatexOptions::default(), "\\(y\\)").unwrap();
        assert_eq!(
            html,
            r#"<div class="latex-output"><style>p{}
b{}</style><div class="latex-content"><p>$y$</p></div></div>"#
        );
    }

    #[test]
    fn test_element_variant() {
        let config = LatexConfig {
            mode: LatexMode::Element,
            ..Default::default()
        };
        let renderer = LatexRenderer::from_config(&config, None);
        let result = renderer.render("\\section{A < B}");
        assert_eq!(
            result.as_str(),
            Some(r#"<latex-js hyphenate="true">\section{A &lt; B}</latex-js>"#)
        );
    }

    #[test]
    fn test_extract_styles_without_styles() {
        assert_eq!(extract_styles("<link rel=\"stylesheet\" href=\"a.css\">"), "");
    }
}
