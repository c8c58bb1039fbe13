//! Element options - naming-convention attributes → option map
//!
//! `data-text-to-show="hi"` under prefix `data-` becomes `{"textToShow": "hi"}`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::control::Control;
use crate::dom::{Document, NodeId};

/// Plain option object handed to a control
pub type OptionMap = Map<String, Value>;

/// `text-to-show` → `textToShow`
///
/// Only a hyphen followed by a lower-case ASCII letter is folded.
pub fn camel_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Read every `prefix`-ed attribute admitted by `accept` into an option map
pub fn extract_element_options(
    doc: &dyn Document,
    node: NodeId,
    prefix: &str,
    accept: impl Fn(&str) -> bool,
) -> OptionMap {
    extract_element_options_with(doc, node, prefix, accept, camel_case)
}

/// Like [`extract_element_options`] with a custom member-name formatter
pub fn extract_element_options_with(
    doc: &dyn Document,
    node: NodeId,
    prefix: &str,
    accept: impl Fn(&str) -> bool,
    format: impl Fn(&str) -> String,
) -> OptionMap {
    doc.attributes(node)
        .into_iter()
        .filter(|(name, _)| name.starts_with(prefix) && accept(name))
        .map(|(name, value)| (format(&name[prefix.len()..]), Value::String(value)))
        .collect()
}

/// Explicit options supplied when loading a control
#[derive(Clone, Default)]
pub struct ControlOptions {
    pub parent: Option<Arc<Control>>,
    pub values: OptionMap,
}

impl ControlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Arc<Control>) -> Self {
        Self {
            parent: Some(parent),
            values: OptionMap::new(),
        }
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Attribute-derived `defaults` overridden by the explicit values
    pub fn merge_over(&self, mut defaults: OptionMap) -> OptionMap {
        for (key, value) in &self.values {
            defaults.insert(key.clone(), value.clone());
        }
        defaults
    }
}

impl std::fmt::Debug for ControlOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlOptions")
            .field("parent", &self.parent.as_ref().map(|p| p.url().to_string()))
            .field("values", &self.values)
            .finish()
    }
}
