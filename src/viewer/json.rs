//! Collapsible tree viewer for parsed JSON values.
//!
//! Each viewer owns the collapse flags for its own keys. Nested objects and
//! arrays get their own child viewer, so expanding a key deep in the tree
//! never touches the state of its ancestors.

use crate::render::{escape_attr, escape_html};
use serde_json::Value;
use std::collections::HashMap;

/// A structured viewer over one JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonViewer {
    data: Value,
    collapsed: HashMap<String, bool>,
    children: HashMap<String, JsonViewer>,
}

/// One row of the viewer: a key and what to show next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonEntry<'a> {
    pub key: String,
    pub value: &'a Value,
    /// Whether the value is an object or array with its own subtree.
    pub nested: bool,
    pub collapsed: bool,
}

impl JsonViewer {
    pub fn new(data: Value) -> Self {
        let children = entries_of(&data)
            .filter(|(_, value)| is_object(value))
            .map(|(key, value)| (key, JsonViewer::new(value.clone())))
            .collect();
        Self {
            data,
            collapsed: HashMap::new(),
            children,
        }
    }

    /// The value this viewer displays.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Object keys in document order; array indices as strings.
    pub fn keys(&self) -> Vec<String> {
        entries_of(&self.data).map(|(key, _)| key).collect()
    }

    /// Flip the collapse state of `key`.
    pub fn toggle(&mut self, key: &str) {
        let flag = self.collapsed.entry(key.to_string()).or_insert(false);
        *flag = !*flag;
    }

    /// Keys start expanded.
    pub fn is_collapsed(&self, key: &str) -> bool {
        self.collapsed.get(key).copied().unwrap_or(false)
    }

    pub fn child(&self, key: &str) -> Option<&JsonViewer> {
        self.children.get(key)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut JsonViewer> {
        self.children.get_mut(key)
    }

    /// The rows shown at this level.
    pub fn entries(&self) -> Vec<JsonEntry<'_>> {
        entries_of(&self.data)
            .map(|(key, value)| JsonEntry {
                nested: is_object(value),
                collapsed: self.is_collapsed(&key),
                key,
                value,
            })
            .collect()
    }

    /// Render the tree as HTML. Collapsed subtrees are omitted.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"json-viewer\">");
        self.write_html(&mut html);
        html.push_str("</div>");
        html
    }

    fn write_html(&self, html: &mut String) {
        if !is_object(&self.data) {
            write_value(html, &self.data);
            return;
        }

        for entry in self.entries() {
            html.push_str("<div class=\"json-entry\">");
            if entry.nested {
                let (marker, state) = if entry.collapsed {
                    ("\u{25b6}", "collapsed")
                } else {
                    ("\u{25bc}", "expanded")
                };
                html.push_str(&format!(
                    "<span class=\"json-toggle {}\" data-key=\"{}\">{}</span>",
                    state,
                    escape_attr(&entry.key),
                    marker
                ));
            }
            html.push_str(&format!(
                "<span class=\"json-key\">{}</span>: ",
                escape_html(&entry.key)
            ));

            match self.child(&entry.key) {
                Some(child) if !entry.collapsed => {
                    html.push_str("<div class=\"json-nested\">");
                    child.write_html(html);
                    html.push_str("</div>");
                }
                Some(_) => html.push_str(&format!(
                    "<span class=\"json-summary\">{}</span>",
                    summary(entry.value)
                )),
                None => write_value(html, entry.value),
            }
            html.push_str("</div>");
        }
    }
}

/// Objects and arrays have children; everything else is a leaf.
pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Display form of a value: `null`, quoted strings, literal numbers and
/// booleans. Containers fall back to compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// CSS class for a leaf value.
pub fn value_class(value: &Value) -> &'static str {
    match value {
        Value::Null => "json-value-null",
        Value::String(_) => "json-value-string",
        Value::Number(_) => "json-value-number",
        Value::Bool(_) => "json-value-boolean",
        Value::Array(_) | Value::Object(_) => "",
    }
}

fn entries_of(value: &Value) -> Box<dyn Iterator<Item = (String, &Value)> + '_> {
    match value {
        Value::Object(map) => Box::new(map.iter().map(|(k, v)| (k.clone(), v))),
        Value::Array(items) => Box::new(items.iter().enumerate().map(|(i, v)| (i.to_string(), v))),
        _ => Box::new(std::iter::empty()),
    }
}

fn write_value(html: &mut String, value: &Value) {
    html.push_str(&format!(
        "<span class=\"json-value {}\">{}</span>",
        value_class(value),
        escape_html(&format_value(value))
    ));
}

fn summary(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "[\u{2026}]",
        _ => "{\u{2026}}",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_keys_in_document_order() {
        let viewer = JsonViewer::new(json!({"b": 1, "a": 2}));
        assert_eq!(viewer.keys(), vec!["b", "a"]);

        let viewer = JsonViewer::new(json!(["x", "y"]));
        assert_eq!(viewer.keys(), vec!["0", "1"]);

        assert!(JsonViewer::new(json!(3)).keys().is_empty());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!("hi")), "\"hi\"");
        assert_eq!(format_value(&json!(1.5)), "1.5");
        assert_eq!(format_value(&json!(false)), "false");
    }

    #[test]
    fn test_value_class() {
        assert_eq!(value_class(&json!(null)), "json-value-null");
        assert_eq!(value_class(&json!("s")), "json-value-string");
        assert_eq!(value_class(&json!(2)), "json-value-number");
        assert_eq!(value_class(&json!(true)), "json-value-boolean");
        assert_eq!(value_class(&json!({})), "");
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut viewer = JsonViewer::new(json!({"nested": {"x": 1}}));
        assert!(!viewer.is_collapsed("nested"));
        viewer.toggle("nested");
        assert!(viewer.is_collapsed("nested"));
        viewer.toggle("nested");
        assert!(!viewer.is_collapsed("nested"));
    }

    #[test]
    fn test_children_have_their_own_state() {
        let mut viewer = JsonViewer::new(json!({"a": {"b": {"c": 1}}, "leaf": 0}));
        assert!(viewer.child("leaf").is_none());

        viewer.child_mut("a").unwrap().toggle("b");
        assert!(!viewer.is_collapsed("a"));
        assert!(!viewer.is_collapsed("b"));
        assert!(viewer.child("a").unwrap().is_collapsed("b"));
    }

    #[test]
    fn test_entries() {
        let mut viewer = JsonViewer::new(json!({"obj": {}, "n": null}));
        viewer.toggle("obj");
        let entries = viewer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "obj");
        assert!(entries[0].nested);
        assert!(entries[0].collapsed);
        assert_eq!(entries[1].value, &Value::Null);
        assert!(!entries[1].nested);
    }

    #[test]
    fn test_html_hides_collapsed_subtree() {
        let mut viewer = JsonViewer::new(json!({"o": {"inner": "<b>"}}));
        let html = viewer.to_html();
        assert!(html.contains("<span class=\"json-key\">inner</span>"));
        assert!(html.contains("\"&lt;b&gt;\""));

        viewer.toggle("o");
        let html = viewer.to_html();
        assert!(!html.contains("inner"));
        assert!(html.contains("json-toggle collapsed"));
    }

    #[test]
    fn test_primitive_root() {
        let viewer = JsonViewer::new(json!("text"));
        assert_eq!(
            viewer.to_html(),
            "<div class=\"json-viewer\"><span class=\"json-value json-value-string\">\"text\"</span></div>"
        );
    }
}
