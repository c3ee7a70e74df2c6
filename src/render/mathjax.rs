//! MathJax passthrough renderer.
//!
//! Math source is returned unchanged; MathJax typesets it in the page after
//! display. [`head_content`] produces the configuration and loader script a
//! standalone page needs for that to happen.

use super::RenderResult;
use crate::config::MathjaxConfig;

/// Identity: the math source is left for the client-side typesetter.
pub fn render_mathjax(data: &str) -> RenderResult {
    RenderResult::Text(data.to_string())
}

/// MathJax configuration and loader script for a document head.
pub fn head_content(config: &MathjaxConfig) -> String {
    // serde_json output is a valid JS literal with backslashes escaped.
    let inline = serde_json::to_string(&config.inline_math).unwrap_or_else(|_| "[]".into());
    let display = serde_json::to_string(&config.display_math).unwrap_or_else(|_| "[]".into());

    format!(
        r#"<script>
MathJax = {{
    tex: {{
        inlineMath: {inline},
        displayMath: {display}
    }}
}};
</script>
<script id="MathJax-script" async src="{src}"></script>"#,
        inline = inline,
        display = display,
        src = super::escape_attr(&config.script_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_input_unchanged() {
        let input = "$x = 1$";
        assert_eq!(render_mathjax(input).as_str(), Some(input));
    }

    #[test]
    fn test_inline_math_syntax() {
        let input = "The quadratic formula is $x = {-b \\pm \\sqrt{b^2-4ac} \\over 2a}$";
        let result = render_mathjax(input);
        assert_eq!(result.as_str(), Some(input));
        assert!(result.as_str().unwrap().contains("$x ="));
    }

    #[test]
    fn test_block_math_syntax() {
        let input = "Euler's Identity:\n$$e^{i\\pi} + 1 = 0$$";
        assert_eq!(render_mathjax(input).as_str(), Some(input));
    }

    #[test]
    fn test_complex_expression() {
        let input = "Integral: $\\int_0^\\infty e^{-x^2} dx = \\frac{\\sqrt{\\pi}}{2}$";
        let result = render_mathjax(input);
        assert!(result.as_str().unwrap().contains("\\int"));
    }

    #[test]
    fn test_head_content_delimiters() {
        let head = head_content(&MathjaxConfig::default());
        assert!(head.contains(r#"inlineMath: [["$","$"],["\\(","\\)"]]"#));
        assert!(head.contains(r#"displayMath: [["$$","$$"],["\\[","\\]"]]"#));
        assert!(head.contains("tex-mml-chtml.js"));
    }
}
