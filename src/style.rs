//! Inline style maps.
//!
//! Callers write styles the way they would in script (`backgroundColor`,
//! `height: 12`). A [`StyleMap`] normalizes keys to CSS property names and
//! numbers to lengths on the way in, so everything downstream speaks plain
//! `set_property` strings.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::Dom;
use crate::error::DomError;

/// Properties whose numeric values carry no unit.
const UNITLESS_PROPERTIES: [&str; 5] = ["opacity", "z-index", "font-weight", "line-height", "flex-grow"];

/// Vendor prefixes that gain a leading dash when converted from camelCase.
const VENDOR_PREFIXES: [&str; 3] = ["webkit-", "moz-", "ms-"];

/// A style value as written by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Text(String),
    Number(f64),
}

/// Ordered map of CSS property name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, StyleValue>")]
pub struct StyleMap(BTreeMap<String, String>);

impl From<BTreeMap<String, StyleValue>> for StyleMap {
    fn from(raw: BTreeMap<String, StyleValue>) -> Self {
        let mut map = Self::new();
        for (key, value) in raw {
            let property = css_property_name(&key);
            let value = match value {
                StyleValue::Text(text) => text,
                StyleValue::Number(n) if UNITLESS_PROPERTIES.contains(&property.as_str()) => n.to_string(),
                StyleValue::Number(n) => format!("{n}px"),
            };
            map.0.insert(property, value);
        }
        map
    }
}

impl StyleMap {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a map from literal `(property, value)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (css_property_name(k), (*v).to_owned()))
                .collect(),
        )
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, property: &str, value: &str) {
        self.0.insert(css_property_name(property), value.to_owned());
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    /// Numeric prefix of a property value, e.g. `12` for `"12px"`.
    #[must_use]
    pub fn px_value(&self, property: &str) -> Option<f64> {
        let raw = self.get(property)?.trim();
        let end = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
            .unwrap_or(raw.len());
        match raw[..end].parse() {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("{property}: {raw:?} has no numeric prefix: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fill properties missing from `self` with those of `defaults`.
    #[must_use]
    pub fn with_defaults(&self, defaults: &StyleMap) -> StyleMap {
        let mut merged = defaults.clone();
        for (k, v) in &self.0 {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Write every property onto `node`.
    ///
    /// # Errors
    ///
    /// Propagates the first failed style write.
    pub fn apply<D: Dom>(&self, dom: &mut D, node: &D::Node) -> Result<(), DomError> {
        for (property, value) in self.iter() {
            dom.set_style(node, property, value)?;
        }
        Ok(())
    }
}

/// Convert a camelCase style key to its CSS property name.
///
/// Keys already in kebab-case pass through unchanged.
#[must_use]
pub fn css_property_name(key: &str) -> String {
    if key.contains('-') || !key.chars().any(|c| c.is_ascii_uppercase()) {
        return key.to_owned();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    if VENDOR_PREFIXES.iter().any(|prefix| out.starts_with(prefix)) {
        out.insert(0, '-');
    }
    out
}
