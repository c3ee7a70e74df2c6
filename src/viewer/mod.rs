//! Interactive viewers for structured render results.

pub mod json;

pub use json::{format_value, is_object, value_class, JsonEntry, JsonViewer};
