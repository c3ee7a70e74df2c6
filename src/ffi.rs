//! C FFI layer for cross-language interoperability.

use crate::component::{NoSanitizer, Omniview};
use crate::format::Format;
use crate::render::render_named;
use libc::{c_char, c_int};
use std::ffi::{CStr, CString};
use std::ptr;

/// Options for rendering.
#[repr(C)]
pub struct OmniviewOptions {
    /// Whether to generate standalone HTML (with DOCTYPE, head, etc.)
    pub standalone: c_int,
    /// 0 to skip markup sanitization (trusted input only)
    pub sanitize: c_int,
    /// Page title for standalone output (null for "Omniview")
    pub title: *const c_char,
}

impl Default for OmniviewOptions {
    fn default() -> Self {
        Self {
            standalone: 0,
            sanitize: 1,
            title: ptr::null(),
        }
    }
}

/// Result type for FFI operations.
#[repr(C)]
pub struct OmniviewResult {
    /// Pointer to result string (caller must free with omniview_free_string)
    pub data: *mut c_char,
    /// Error message if data is null (caller must free with omniview_free_string)
    pub error: *mut c_char,
}

impl OmniviewResult {
    fn ok(data: String) -> Self {
        Self {
            data: to_c_string(data).into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn err(error: impl Into<String>) -> Self {
        Self {
            data: ptr::null_mut(),
            error: to_c_string(error.into()).into_raw(),
        }
    }
}

/// Interior NULs cannot cross the boundary; they are dropped.
fn to_c_string(s: String) -> CString {
    CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}

unsafe fn read_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, OmniviewResult> {
    if s.is_null() {
        return Err(OmniviewResult::err(format!("Null {} pointer", what)));
    }
    CStr::from_ptr(s)
        .to_str()
        .map_err(|_| OmniviewResult::err(format!("Invalid UTF-8 {}", what)))
}

/// Render `data` in the named format to HTML.
///
/// An unrecognized format name returns `data` unchanged.
///
/// # Safety
///
/// - `data` and `format` must be valid null-terminated UTF-8 strings.
/// - `options` must be a valid pointer to OmniviewOptions, or null.
/// - The returned strings must be freed with `omniview_free_result`.
#[no_mangle]
pub unsafe extern "C" fn omniview_render(
    data: *const c_char,
    format: *const c_char,
    options: *const OmniviewOptions,
) -> OmniviewResult {
    let data = match read_str(data, "data") {
        Ok(s) => s,
        Err(e) => return e,
    };
    let format = match read_str(format, "format") {
        Ok(s) => s,
        Err(e) => return e,
    };
    let Ok(format) = format.parse::<Format>() else {
        return OmniviewResult::ok(data.to_string());
    };

    let defaults = OmniviewOptions::default();
    let options = if options.is_null() { &defaults } else { &*options };

    let mut builder = Omniview::builder().data(data).format(format);
    if options.sanitize == 0 {
        builder = builder.sanitizer(NoSanitizer);
    }
    let view = builder.build();

    if options.standalone != 0 {
        let title = if options.title.is_null() {
            "Omniview"
        } else {
            CStr::from_ptr(options.title).to_str().unwrap_or("Omniview")
        };
        OmniviewResult::ok(view.to_document(title))
    } else {
        OmniviewResult::ok(view.to_html())
    }
}

/// Render `data` in the named format and return the result as JSON:
/// `{"kind": "text" | "markup" | "tree" | "error", "value": ...}`.
///
/// # Safety
///
/// - `data` and `format` must be valid null-terminated UTF-8 strings.
/// - The returned strings must be freed with `omniview_free_result`.
#[no_mangle]
pub unsafe extern "C" fn omniview_render_json_tree(
    data: *const c_char,
    format: *const c_char,
) -> OmniviewResult {
    let data = match read_str(data, "data") {
        Ok(s) => s,
        Err(e) => return e,
    };
    let format = match read_str(format, "format") {
        Ok(s) => s,
        Err(e) => return e,
    };

    match serde_json::to_string(&render_named(format, data)) {
        Ok(json) => OmniviewResult::ok(json),
        Err(e) => OmniviewResult::err(format!("Serialization error: {}", e)),
    }
}

/// Free a string returned by omniview functions.
///
/// # Safety
///
/// - `s` must be a pointer returned by an omniview function, or null.
#[no_mangle]
pub unsafe extern "C" fn omniview_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free a result struct.
///
/// # Safety
///
/// - `result` must be a valid OmniviewResult.
#[no_mangle]
pub unsafe extern "C" fn omniview_free_result(result: OmniviewResult) {
    omniview_free_string(result.data);
    omniview_free_string(result.error);
}

/// Get the library version.
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn omniview_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn take(result: OmniviewResult) -> (Option<String>, Option<String>) {
        let read = |p: *mut c_char| {
            (!p.is_null()).then(|| CStr::from_ptr(p).to_string_lossy().into_owned())
        };
        let out = (read(result.data), read(result.error));
        omniview_free_result(result);
        out
    }

    #[test]
    fn test_render_html() {
        let data = CString::new("# Title").unwrap();
        let format = CString::new("markdown").unwrap();
        let (html, error) =
            unsafe { take(omniview_render(data.as_ptr(), format.as_ptr(), ptr::null())) };
        assert_eq!(
            html.as_deref(),
            Some("<div class=\"omniview-content\"><h1>Title</h1>\n</div>")
        );
        assert!(error.is_none());
    }

    #[test]
    fn test_render_standalone() {
        let data = CString::new("hi").unwrap();
        let format = CString::new("text").unwrap();
        let title = CString::new("Doc").unwrap();
        let options = OmniviewOptions {
            standalone: 1,
            sanitize: 1,
            title: title.as_ptr(),
        };
        let (html, _) = unsafe { take(omniview_render(data.as_ptr(), format.as_ptr(), &options)) };
        let html = html.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Doc</title>"));
    }

    #[test]
    fn test_unknown_format_returns_data() {
        let data = CString::new("<raw>").unwrap();
        let format = CString::new("unknown").unwrap();
        let (out, _) = unsafe { take(omniview_render(data.as_ptr(), format.as_ptr(), ptr::null())) };
        assert_eq!(out.as_deref(), Some("<raw>"));
    }

    #[test]
    fn test_null_input() {
        let format = CString::new("text").unwrap();
        let (data, error) =
            unsafe { take(omniview_render(ptr::null(), format.as_ptr(), ptr::null())) };
        assert!(data.is_none());
        assert_eq!(error.as_deref(), Some("Null data pointer"));
    }

    #[test]
    fn test_json_tree() {
        let data = CString::new("{bad}").unwrap();
        let format = CString::new("json").unwrap();
        let (json, _) = unsafe { take(omniview_render_json_tree(data.as_ptr(), format.as_ptr())) };
        assert_eq!(
            json.as_deref(),
            Some(r#"{"kind":"error","value":{"message":"Invalid JSON","raw":"{bad}"}}"#)
        );
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(omniview_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_interior_nul_is_dropped() {
        assert_eq!(to_c_string("a\0b".to_string()).as_bytes(), b"ab");
    }
}
