//! Content formats understood by the dispatcher.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The content type selecting which renderer processes an input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Plain text, shown as-is.
    #[default]
    Text,
    /// Raw HTML markup.
    Html,
    /// Markdown converted to HTML.
    Markdown,
    /// A LaTeX document or fragment converted to HTML.
    Latex,
    /// Math source left for a client-side typesetter.
    Mathjax,
    /// JSON parsed into a value tree.
    Json,
    /// Source code (not yet rendered).
    Code,
}

impl Format {
    /// Every format, in declaration order.
    pub const ALL: [Format; 7] = [
        Format::Text,
        Format::Html,
        Format::Markdown,
        Format::Latex,
        Format::Mathjax,
        Format::Json,
        Format::Code,
    ];

    /// Lowercase identifier of the format.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Html => "html",
            Format::Markdown => "markdown",
            Format::Latex => "latex",
            Format::Mathjax => "mathjax",
            Format::Json => "json",
            Format::Code => "code",
        }
    }

    /// Whether the renderer for this format produces HTML markup.
    pub fn is_markup(self) -> bool {
        matches!(self, Format::Html | Format::Markdown | Format::Latex)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Format::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownFormat(name.to_string()))
    }
}
