//! Markdown renderer.

use super::RenderResult;
use crate::config::MarkdownConfig;
use pulldown_cmark::{html, Options, Parser};

/// A Markdown-to-HTML conversion capability.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// CommonMark (plus the configured GFM extensions) via `pulldown-cmark`.
#[derive(Debug, Clone)]
pub struct CommonMarkConverter {
    options: Options,
}

impl CommonMarkConverter {
    pub fn new(config: &MarkdownConfig) -> Self {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, config.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, config.tasklists);
        options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
        options.set(Options::ENABLE_SMART_PUNCTUATION, config.smart_punctuation);
        Self { options }
    }
}

impl Default for CommonMarkConverter {
    fn default() -> Self {
        Self::new(&MarkdownConfig::default())
    }
}

impl MarkdownConverter for CommonMarkConverter {
    fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Hand the input to `converter`.
pub fn render_markdown(converter: &dyn MarkdownConverter, data: &str) -> RenderResult {
    RenderResult::Markup(converter.to_html(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> String {
        let converter = CommonMarkConverter::default();
        render_markdown(&converter, input)
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_heading() {
        assert!(render("# Hello World").contains("<h1>Hello World</h1>"));
    }

    #[test]
    fn test_emphasis_and_lists() {
        let html = render("- Item 1\n- Item 2\n\n**Bold text** and *italic text*");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>Item 1</li>"));
        assert!(html.contains("<strong>Bold text</strong>"));
        assert!(html.contains("<em>italic text</em>"));
    }

    #[test]
    fn test_table_extension() {
        let input = "| A | B |\n| - | - |\n| 1 | 2 |";
        assert!(render(input).contains("<table>"));

        let plain = CommonMarkConverter::new(&MarkdownConfig {
            tables: false,
            ..Default::default()
        });
        assert!(!plain.to_html(input).contains("<table>"));
    }

    #[test]
    fn test_code_block_language() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="language-rust">"#));
    }

    #[test]
    fn test_custom_converter() {
        struct Upper;
        impl MarkdownConverter for Upper {
            fn to_html(&self, markdown: &str) -> String {
                markdown.to_uppercase()
            }
        }
        assert_eq!(render_markdown(&Upper, "abc").as_str(), Some("ABC"));
    }
}
