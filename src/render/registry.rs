//! Format registry and dispatch.

use super::html::render_html;
use super::json::render_json;
use super::latex::LatexRenderer;
use super::markdown::{render_markdown, CommonMarkConverter};
use super::mathjax::render_mathjax;
use super::placeholder::render_code;
use super::text::render_text;
use super::{RenderResult, Renderer};
use crate::config::OmniviewConfig;
use crate::format::Format;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Renderer used for formats nobody registered: returns the input as text.
struct Passthrough;

impl Renderer for Passthrough {
    fn render(&self, data: &str) -> RenderResult {
        RenderResult::Text(data.to_string())
    }
}

/// Maps each format to the renderer that handles it.
pub struct Registry {
    renderers: HashMap<Format, Box<dyn Renderer>>,
}

impl Registry {
    /// An empty registry; every format falls back to passthrough.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// A registry holding the built-in renderer for every format.
    pub fn with_config(config: &OmniviewConfig) -> Self {
        let mut registry = Self::new();
        let markdown = CommonMarkConverter::new(&config.markdown);
        let latex = LatexRenderer::from_config(
            &config.latex,
            Some(config.assets.stylesheet_url.clone()),
        );

        registry.register(Format::Text, render_text);
        registry.register(Format::Html, render_html);
        registry.register(Format::Markdown, move |data: &str| {
            render_markdown(&markdown, data)
        });
        registry.register(Format::Latex, latex);
        registry.register(Format::Mathjax, render_mathjax);
        registry.register(Format::Json, render_json);
        registry.register(Format::Code, render_code);
        registry
    }

    /// Register `renderer` for `format`, returning the one it replaces.
    pub fn register<R>(&mut self, format: Format, renderer: R) -> Option<Box<dyn Renderer>>
    where
        R: Renderer + 'static,
    {
        self.renderers.insert(format, Box::new(renderer))
    }

    pub fn unregister(&mut self, format: Format) -> Option<Box<dyn Renderer>> {
        self.renderers.remove(&format)
    }

    pub fn contains(&self, format: Format) -> bool {
        self.renderers.contains_key(&format)
    }

    /// The renderer for `format`, or the passthrough renderer.
    pub fn get(&self, format: Format) -> &dyn Renderer {
        match self.renderers.get(&format) {
            Some(renderer) => renderer.as_ref(),
            None => {
                debug!(%format, "no renderer registered, passing through");
                &Passthrough
            }
        }
    }

    /// Render `data` as `format`.
    ///
    /// Empty input yields the empty value without invoking a renderer.
    pub fn render(&self, format: Format, data: &str) -> RenderResult {
        if data.is_empty() {
            return RenderResult::empty();
        }
        debug!(%format, len = data.len(), "rendering");
        self.get(format).render(data)
    }

    /// Render `data` in the format called `name`; unrecognized names pass
    /// the input through unchanged.
    pub fn render_named(&self, name: &str, data: &str) -> RenderResult {
        if data.is_empty() {
            return RenderResult::empty();
        }
        match name.parse::<Format>() {
            Ok(format) => self.render(format, data),
            Err(_) => {
                debug!(format_name = name, "unrecognized format, passing through");
                RenderResult::Text(data.to_string())
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_config(&OmniviewConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&str> = self.renderers.keys().map(|f| f.as_str()).collect();
        formats.sort_unstable();
        f.debug_struct("Registry").field("formats", &formats).finish()
    }
}

/// The shared registry built from the default configuration.
pub fn default_registry() -> &'static Arc<Registry> {
    static DEFAULT: OnceLock<Arc<Registry>> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(Registry::default()))
}

/// Render `data` as `format` with the default registry.
pub fn render(format: Format, data: &str) -> RenderResult {
    default_registry().render(format, data)
}

/// Render `data` in the format called `name` with the default registry.
pub fn render_named(name: &str, data: &str) -> RenderResult {
    default_registry().render_named(name, data)
}
