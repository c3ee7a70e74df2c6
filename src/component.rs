//! The display component.
//!
//! [`Omniview`] holds the content and its format, dispatches through a
//! [`Registry`], and turns the result into something a host can show: a
//! [`View`] for programmatic use, an HTML fragment, or a standalone page.
//! Markup results pass through a [`Sanitizer`] before they leave the
//! component.

use crate::assets::{element_import_script, stylesheet_link, AssetRegistry, LoadedAssets};
use crate::config::{LatexMode, OmniviewConfig};
use crate::format::Format;
use crate::render::{default_registry, escape_html, mathjax, RenderResult, Registry};
use crate::viewer::JsonViewer;
use std::fmt;
use std::sync::Arc;

/// Cleans markup before it is inserted into a page.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Passes markup through untouched. Only for trusted content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSanitizer;

impl Sanitizer for NoSanitizer {
    fn sanitize(&self, html: &str) -> String {
        html.to_string()
    }
}

/// Removes script-bearing elements, inline event handlers and script URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSanitizer;

/// Elements dropped together with their content.
const BLOCKED_ELEMENTS: &[&str] = &["script", "iframe", "object", "embed"];

/// Blocked elements that never have content.
const VOID_ELEMENTS: &[&str] = &["embed"];

/// Attributes whose value is a URL.
const URL_ATTRIBUTES: &[&str] = &[
    "href", "src", "action", "formaction", "xlink:href", "data", "to", "from",
];

/// SVG animation attributes holding a `;`-separated list of values.
const URL_LIST_ATTRIBUTES: &[&str] = &["values"];

struct Attribute<'a> {
    name: String,
    value: Option<&'a str>,
    raw: &'a str,
}

struct Tag<'a> {
    name: &'a str,
    closing: bool,
    self_closing: bool,
    attributes: Vec<Attribute<'a>>,
    len: usize,
}

impl Sanitizer for DefaultSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(lt) = rest.find('<') {
            out.push_str(&rest[..lt]);
            let at = &rest[lt..];

            if let Some(body) = at.strip_prefix("<!--") {
                let end = body.find("-->").map_or(at.len(), |i| 4 + i + 3);
                rest = &at[end..];
                continue;
            }

            match parse_tag(at) {
                Some(tag) => {
                    rest = &at[tag.len..];
                    let name = tag.name.to_ascii_lowercase();
                    if BLOCKED_ELEMENTS.contains(&name.as_str()) {
                        let has_content = !tag.closing
                            && !tag.self_closing
                            && !VOID_ELEMENTS.contains(&name.as_str());
                        if has_content {
                            rest = skip_element(rest, &name);
                        }
                        continue;
                    }
                    write_tag(&mut out, &tag);
                }
                None => {
                    out.push_str("&lt;");
                    rest = &at[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse the tag at the start of `input` (which begins with `<`).
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let bytes = input.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'-' | b':')) {
        i += 1;
    }
    let name = &input[name_start..i];

    let mut attributes = Vec::new();
    let mut self_closing = false;
    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            self_closing = bytes[i] == b'/';
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => {
                i += 1;
                break;
            }
            _ => self_closing = false,
        }

        let attr_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let attr_name = input[attr_start..i].to_ascii_lowercase();

        let mut value = None;
        let j = skip_whitespace(bytes, i);
        if bytes.get(j) == Some(&b'=') {
            let mut j = skip_whitespace(bytes, j + 1);
            match bytes.get(j) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let close = input[j + 1..].find(quote as char)?;
                    value = Some(&input[j + 1..j + 1 + close]);
                    j += close + 2;
                }
                _ => {
                    let start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = Some(&input[start..j]);
                }
            }
            i = j;
        }

        attributes.push(Attribute {
            name: attr_name,
            value,
            raw: &input[attr_start..i],
        });
    }

    Some(Tag {
        name,
        closing,
        self_closing,
        attributes,
        len: i,
    })
}

/// Skip past the closing tag of `name`; an unclosed element swallows the rest.
fn skip_element<'a>(rest: &'a str, name: &str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let close = format!("</{}", name);
    lower
        .find(&close)
        .and_then(|start| lower[start..].find('>').map(|end| &rest[start + end + 1..]))
        .unwrap_or("")
}

/// Decode the character reference following a `&`, returning the character
/// and the number of bytes it spans. Numeric references may omit the `;`.
fn decode_reference(at: &str) -> Option<(char, usize)> {
    if let Some(number) = at.strip_prefix('#') {
        let (digits, radix, prefix) = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => (hex, 16, 2),
            None => (number, 10, 1),
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return None;
        }
        let c = u32::from_str_radix(&digits[..len], radix)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{fffd}');
        let semicolon = usize::from(digits[len..].starts_with(';'));
        return Some((c, prefix + len + semicolon));
    }

    let end = at.find(';')?;
    let c = match &at[..end] {
        "colon" => ':',
        "Tab" => '\t',
        "NewLine" => '\n',
        "amp" => '&',
        "sol" => '/',
        "lpar" => '(',
        "rpar" => ')',
        "quot" => '"',
        "apos" => '\'',
        _ => return None,
    };
    Some((c, end + 1))
}

/// Attribute text as the browser sees it after reference decoding.
fn decode_references(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let at = &rest[amp + 1..];
        match decode_reference(at) {
            Some((c, len)) => {
                out.push(c);
                rest = &at[len..];
            }
            None => {
                out.push('&');
                rest = at;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

fn is_safe_attribute(attr: &Attribute<'_>) -> bool {
    if attr.name.is_empty() || attr.name.starts_with("on") {
        return false;
    }
    let Some(value) = attr.value else {
        return true;
    };
    let name = attr.name.as_str();
    if URL_ATTRIBUTES.contains(&name) {
        return !is_script_url(&decode_references(value));
    }
    if URL_LIST_ATTRIBUTES.contains(&name) {
        return !decode_references(value).split(';').any(is_script_url);
    }
    true
}

fn write_tag(out: &mut String, tag: &Tag<'_>) {
    out.push('<');
    if tag.closing {
        out.push('/');
        out.push_str(tag.name);
        out.push('>');
        return;
    }
    out.push_str(tag.name);
    for attr in tag.attributes.iter().filter(|a| is_safe_attribute(a)) {
        out.push(' ');
        out.push_str(attr.raw);
    }
    if tag.self_closing {
        out.push_str(" /");
    }
    out.push('>');
}

/// What the component shows for its current content.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Empty,
    Text(String),
    /// Sanitized markup.
    Markup(String),
    Json(JsonViewer),
    Error { message: String, raw: Option<String> },
}

impl View {
    /// The inner HTML for this view.
    pub fn to_html(&self) -> String {
        match self {
            View::Empty => String::new(),
            View::Text(text) => escape_html(text),
            View::Markup(html) => html.clone(),
            View::Json(viewer) => viewer.to_html(),
            View::Error { message, raw } => {
                let mut html = format!(
                    "<div class=\"omniview-error\"><p class=\"omniview-error-message\">{}</p>",
                    escape_html(message)
                );
                if let Some(raw) = raw {
                    html.push_str(&format!(
                        "<pre class=\"omniview-error-raw\">{}</pre>",
                        escape_html(raw)
                    ));
                }
                html.push_str("</div>");
                html
            }
        }
    }
}

/// Universal content display.
pub struct Omniview {
    data: String,
    format: Format,
    config: OmniviewConfig,
    registry: Arc<Registry>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl Omniview {
    /// Display `data` as `format` with the shared default registry.
    pub fn new(data: impl Into<String>, format: Format) -> Self {
        Self::builder().data(data).format(format).build()
    }

    pub fn builder() -> OmniviewBuilder {
        OmniviewBuilder::default()
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    /// Dispatch the current content to its renderer.
    pub fn rendered_content(&self) -> RenderResult {
        self.registry.render(self.format, &self.data)
    }

    pub fn view(&self) -> View {
        match self.rendered_content() {
            RenderResult::Text(text) if text.is_empty() => View::Empty,
            RenderResult::Text(text) => View::Text(text),
            RenderResult::Markup(html) => View::Markup(self.sanitizer.sanitize(&html)),
            RenderResult::Tree(value) => View::Json(JsonViewer::new(value)),
            RenderResult::Error(failure) => View::Error {
                message: failure.message,
                raw: failure.raw,
            },
        }
    }

    /// The content as an HTML fragment.
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"omniview-content\">{}</div>",
            self.view().to_html()
        )
    }

    /// Scripts and stylesheets the current format needs in the page head.
    pub fn head_content(&self) -> String {
        self.head_with(None)
    }

    fn head_with(&self, loaded: Option<&LoadedAssets>) -> String {
        let assets = &self.config.assets;
        match self.format {
            Format::Mathjax => mathjax::head_content(&self.config.mathjax),
            Format::Latex => match (self.config.latex.mode, loaded) {
                (LatexMode::Element, Some(loaded)) => loaded.head_content(),
                (LatexMode::Element, None) => format!(
                    "{}\n{}",
                    stylesheet_link(&assets.stylesheet_url),
                    element_import_script(&assets.element_module_url)
                ),
                (LatexMode::Document, _) => stylesheet_link(&assets.stylesheet_url),
            },
            _ => String::new(),
        }
    }

    /// A complete HTML page showing the content.
    pub fn to_document(&self, title: &str) -> String {
        self.document(title, &self.head_content())
    }

    /// Like [`to_document`](Self::to_document), but in element mode the
    /// `<latex-js>` module is loaded once through `assets` and inlined into
    /// the page. If loading fails the page imports the module from its URL.
    pub async fn to_document_with_assets(&self, title: &str, assets: &AssetRegistry) -> String {
        let loaded = if self.format == Format::Latex && self.config.latex.mode == LatexMode::Element
        {
            assets.ensure_registered().await
        } else {
            None
        };
        self.document(title, &self.head_with(loaded))
    }

    fn document(&self, title: &str, head: &str) -> String {
        let mut output = String::new();
        output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        output.push_str("<meta charset=\"UTF-8\">\n");
        output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        output.push_str(&format!("<title>{}</title>\n", escape_html(title)));

        if !head.is_empty() {
            output.push_str(head);
            output.push('\n');
        }
        output.push_str(DEFAULT_STYLES);

        output.push_str("</head>\n<body>\n");
        output.push_str(&self.to_html());
        output.push_str("\n</body>\n</html>\n");
        output
    }
}

impl fmt::Debug for Omniview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Omniview")
            .field("data", &self.data)
            .field("format", &self.format)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Omniview`].
#[derive(Default)]
pub struct OmniviewBuilder {
    data: String,
    format: Option<Format>,
    config: Option<OmniviewConfig>,
    registry: Option<Arc<Registry>>,
    sanitizer: Option<Arc<dyn Sanitizer>>,
}

impl OmniviewBuilder {
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Use `config` for renderer options, the default format and page assets.
    pub fn config(mut self, config: OmniviewConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn build(self) -> Omniview {
        let registry = match (self.registry, &self.config) {
            (Some(registry), _) => registry,
            (None, Some(config)) => Arc::new(Registry::with_config(config)),
            (None, None) => Arc::clone(default_registry()),
        };
        let config = self.config.unwrap_or_default();
        Omniview {
            data: self.data,
            format: self.format.unwrap_or(config.default_format),
            config,
            registry,
            sanitizer: self.sanitizer.unwrap_or_else(|| Arc::new(DefaultSanitizer)),
        }
    }
}

const DEFAULT_STYLES: &str = r#"<style>
.omniview-content { width: 100%; height: 100%; white-space: pre-wrap; word-wrap: break-word; }
.omniview-error { border: 1px solid #e0b4b4; background: #fff6f6; padding: 0.5em 1em; }
.omniview-error-raw, .latex-error-source { white-space: pre-wrap; font-family: monospace; }
.latex-error { border: 1px solid #e0b4b4; background: #fff6f6; padding: 0.5em 1em; }
.json-viewer { font-family: monospace; white-space: normal; }
.json-nested { margin-left: 1.5em; }
.json-toggle { cursor: pointer; user-select: none; margin-right: 0.25em; }
.json-key { color: #881391; }
.json-value-string { color: #c41a16; }
.json-value-number { color: #1c00cf; }
.json-value-boolean { color: #0d22aa; }
.json-value-null { color: #808080; }
</style>
"#;
