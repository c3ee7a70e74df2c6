//! Error types for the omniview library.
//!
//! Renderers never return these: every adapter folds its failure into a
//! [`RenderResult`](crate::render::RenderResult). The types here belong to
//! the fallible outer surfaces (configuration, the LaTeX conversion
//! capability, the remote asset loader).

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LaTeX error: {0}")]
    Latex(#[from] LatexError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Errors raised by a LaTeX conversion capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatexError {
    #[error("unsupported document class: {0}")]
    UnsupportedClass(String),

    #[error("package not supported: {0}")]
    UnsupportedPackage(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("unknown macro: \\{0}")]
    UnknownMacro(String),

    #[error("unterminated {0}")]
    Unterminated(String),

    #[error("unexpected {0}")]
    Unexpected(String),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("\\documentclass given without \\begin{{document}}")]
    MissingDocumentBegin,

    #[error("math error in `{source_text}`: {message}")]
    Math { source_text: String, message: String },
}

/// Errors from the optional remote asset loader.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("no fetcher available for {0}")]
    Missing(String),
}
