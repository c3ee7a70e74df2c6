//! Configuration loaded from TOML.
//!
//! ```text
//! default_format = "markdown"
//!
//! [markdown]
//! tables = true
//! footnotes = true
//!
//! [latex]
//! mode = "document"
//! hyphenate = true
//! extra_packages = ["siunitx"]
//!
//! [mathjax]
//! inline_math = [["$", "$"], ["\\(", "\\)"]]
//! display_math = [["$$", "$$"], ["\\[", "\\]"]]
//!
//! [assets]
//! stylesheet_url = "https://cdn.jsdelivr.net/npm/katex@0.16.8/dist/katex.min.css"
//! ```

use crate::error::{ConfigError, Result};
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the renderers and the display component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OmniviewConfig {
    /// Format used when a caller does not name one.
    pub default_format: Format,
    /// Markdown conversion options.
    pub markdown: MarkdownConfig,
    /// LaTeX adapter options.
    pub latex: LatexConfig,
    /// Client-side math typesetting options.
    pub mathjax: MathjaxConfig,
    /// Remote assets for the LaTeX custom-element variant.
    pub assets: AssetConfig,
}

impl OmniviewConfig {
    /// Parse and validate a TOML configuration string.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: OmniviewConfig =
            toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        let pairs = self
            .mathjax
            .inline_math
            .iter()
            .chain(self.mathjax.display_math.iter());
        for [open, close] in pairs {
            if open.is_empty() || close.is_empty() {
                return Err(ConfigError::Invalid(
                    "math delimiters must not be empty".into(),
                ));
            }
        }
        if self.latex.extra_packages.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("empty package name in latex.extra_packages".into()));
        }
        Ok(())
    }
}

/// Markdown extensions passed to the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: false,
            smart_punctuation: false,
        }
    }
}

/// Which LaTeX adapter variant handles the `latex` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatexMode {
    /// Convert the document to HTML in-process.
    #[default]
    Document,
    /// Emit a `<latex-js>` element rendered by the browser component.
    Element,
}

/// LaTeX adapter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    pub mode: LatexMode,
    /// Let the browser hyphenate paragraphs.
    pub hyphenate: bool,
    /// Packages accepted in addition to the built-in list.
    pub extra_packages: Vec<String>,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            mode: LatexMode::Document,
            hyphenate: true,
            extra_packages: Vec::new(),
        }
    }
}

/// MathJax configuration emitted into standalone pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathjaxConfig {
    pub inline_math: Vec<[String; 2]>,
    pub display_math: Vec<[String; 2]>,
    pub script_url: String,
}

impl Default for MathjaxConfig {
    fn default() -> Self {
        let pair = |a: &str, b: &str| [a.to_string(), b.to_string()];
        Self {
            inline_math: vec![pair("$", "$"), pair("\\(", "\\)")],
            display_math: vec![pair("$$", "$$"), pair("\\[", "\\]")],
            script_url: "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js".to_string(),
        }
    }
}

/// CDN locations of the optional LaTeX custom element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub element_module_url: String,
    pub stylesheet_url: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            element_module_url: "https://cdn.jsdelivr.net/npm/latex.js/dist/latex.mjs".to_string(),
            stylesheet_url: "https://cdn.jsdelivr.net/npm/katex@0.16.8/dist/katex.min.css"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_config_is_default() {
        let config = OmniviewConfig::from_toml_str("").unwrap();
        assert_eq!(config, OmniviewConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let input = r#"
default_format = "markdown"

[latex]
mode = "element"
extra_packages = ["siunitx"]

[markdown]
footnotes = true
"#;
        let config = OmniviewConfig::from_toml_str(input).unwrap();
        assert_eq!(config.default_format, Format::Markdown);
        assert_eq!(config.latex.mode, LatexMode::Element);
        assert!(config.latex.hyphenate);
        assert_eq!(config.latex.extra_packages, vec!["siunitx".to_string()]);
        assert!(config.markdown.footnotes);
        assert!(config.markdown.tables);
    }

    #[test]
    fn test_mathjax_delimiters() {
        let input = r#"
[mathjax]
inline_math = [["$", "$"]]
"#;
        let config = OmniviewConfig::from_toml_str(input).unwrap();
        assert_eq!(config.mathjax.inline_math.len(), 1);
        assert_eq!(config.mathjax.display_math.len(), 2);
    }

    #[test]
    fn test_invalid_toml() {
        let err = OmniviewConfig::from_toml_str("default_format = ").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_format_name_rejected() {
        let err = OmniviewConfig::from_toml_str("default_format = \"rtf\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Toml(_))));
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let input = r#"
[mathjax]
inline_math = [["", "$"]]
"#;
        let err = OmniviewConfig::from_toml_str(input).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = OmniviewConfig::from_file("/nonexistent/omniview.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
