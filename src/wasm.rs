//! WebAssembly bindings for JavaScript/TypeScript.

#![cfg(feature = "wasm")]

use crate::component::{NoSanitizer, Omniview};
use crate::format::Format;
use crate::render::render_named;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Render content and return the raw result.
///
/// The returned object is `{ kind, value }` where `kind` is one of
/// `"text"`, `"markup"`, `"tree"` or `"error"`.
#[wasm_bindgen(js_name = renderContent)]
pub fn render_content(data: &str, format: &str) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(&render_named(format, data))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Render content to an HTML fragment ready for insertion.
///
/// # Arguments
///
/// * `data` - The raw content.
/// * `format` - Format name; unknown names return `data` unchanged.
/// * `trusted` - Skip markup sanitization.
#[wasm_bindgen(js_name = renderToHtml)]
pub fn render_to_html(data: &str, format: &str, trusted: Option<bool>) -> String {
    let Ok(format) = format.parse::<Format>() else {
        return data.to_string();
    };
    let mut builder = Omniview::builder().data(data).format(format);
    if trusted.unwrap_or(false) {
        builder = builder.sanitizer(NoSanitizer);
    }
    builder.build().to_html()
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check whether a format name is supported.
#[wasm_bindgen(js_name = hasFormat)]
pub fn has_format(name: &str) -> bool {
    name.parse::<Format>().is_ok()
}

/// List every supported format name.
#[wasm_bindgen(js_name = listFormats)]
pub fn list_formats() -> js_sys::Array {
    Format::ALL
        .iter()
        .map(|format| JsValue::from_str(format.as_str()))
        .collect()
}
