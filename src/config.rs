//! Caller options and the merged configuration.
//!
//! [`Options`] mirrors what a caller passes in (every field optional, script-style
//! camelCase names). [`Config::merged`] lays it over the defaults: style maps
//! and per-button tables merge key by key, while the module list is replaced
//! wholesale. Per-button entries for alignments the toolbar does not offer are
//! skipped with a warning.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_IMAGE_SELECTOR, SCROLL_DEBOUNCE_MS};
use crate::error::ResizeError;
use crate::module::BuiltinModule;
use crate::style::StyleMap;

/// Image alignment offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    AlignLeft,
    AlignCenter,
    AlignRight,
}

impl Alignment {
    /// Toolbar order.
    pub const ALL: [Alignment; 3] = [Self::AlignLeft, Self::AlignCenter, Self::AlignRight];

    /// Option key naming this alignment.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AlignLeft => "alignLeft",
            Self::AlignCenter => "alignCenter",
            Self::AlignRight => "alignRight",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// Keep entries keyed by a known alignment; warn about the rest.
fn by_alignment<V>(table: BTreeMap<String, V>, option: &str) -> impl Iterator<Item = (Alignment, V)> {
    table.into_iter().filter_map(move |(key, value)| match Alignment::from_name(&key) {
        Some(alignment) => Some((alignment, value)),
        None => {
            log::warn!("image resize: ignoring {option} entry for unknown button {key:?}");
            None
        }
    })
}

/// Options as supplied by the caller. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub overlay_styles: Option<StyleMap>,
    pub handle_styles: Option<StyleMap>,
    #[serde(rename = "displaySize")]
    pub show_size_label: Option<bool>,
    #[serde(rename = "displayStyles")]
    pub size_label_styles: Option<StyleMap>,
    #[serde(rename = "displayToolbar")]
    pub show_toolbar: Option<bool>,
    pub toolbar_buttons: Option<BTreeMap<String, bool>>,
    pub toolbar_styles: Option<StyleMap>,
    pub toolbar_button_styles: Option<BTreeMap<String, StyleMap>>,
    pub modules: Option<Vec<String>>,
    pub image_selector: Option<String>,
    pub scroll_debounce_ms: Option<u32>,
}

impl Options {
    /// Parse options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Options`] if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ResizeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fully merged configuration, fixed for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub overlay_styles: StyleMap,
    pub handle_styles: StyleMap,
    #[serde(rename = "displaySize")]
    pub show_size_label: bool,
    #[serde(rename = "displayStyles")]
    pub size_label_styles: StyleMap,
    #[serde(rename = "displayToolbar")]
    pub show_toolbar: bool,
    pub toolbar_buttons: BTreeMap<Alignment, bool>,
    pub toolbar_styles: StyleMap,
    pub toolbar_button_styles: BTreeMap<Alignment, StyleMap>,
    pub modules: Vec<String>,
    pub image_selector: String,
    pub scroll_debounce_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay_styles: StyleMap::from_pairs(&[
                ("position", "absolute"),
                ("boxSizing", "border-box"),
                ("border", "1px dashed #444"),
            ]),
            handle_styles: StyleMap::from_pairs(&[
                ("position", "absolute"),
                ("height", "12px"),
                ("width", "12px"),
                ("backgroundColor", "white"),
                ("border", "1px solid #777"),
                ("boxSizing", "border-box"),
                ("opacity", "0.80"),
            ]),
            show_size_label: true,
            size_label_styles: StyleMap::from_pairs(&[
                ("position", "absolute"),
                ("font", "12px/1.0 Arial, Helvetica, sans-serif"),
                ("padding", "4px 8px"),
                ("textAlign", "center"),
                ("backgroundColor", "white"),
                ("color", "#333"),
                ("border", "1px solid #777"),
                ("boxSizing", "border-box"),
                ("opacity", "0.80"),
                ("cursor", "default"),
            ]),
            show_toolbar: true,
            toolbar_buttons: BTreeMap::from([(Alignment::AlignLeft, true), (Alignment::AlignRight, true)]),
            toolbar_styles: StyleMap::from_pairs(&[
                ("position", "absolute"),
                ("font", "12px/1.0 Arial, Helvetica, sans-serif"),
                ("padding", "4px 8px"),
                ("textAlign", "center"),
                ("backgroundColor", "white"),
                ("color", "#333"),
                ("border", "1px solid #777"),
                ("boxSizing", "border-box"),
                ("boxShadow", "2px 2px 2px rgba(0,0,0,0.25)"),
                ("cursor", "default"),
            ]),
            toolbar_button_styles: Alignment::ALL.iter().map(|a| (*a, StyleMap::new())).collect(),
            modules: BuiltinModule::ALL.iter().map(|m| m.name().to_owned()).collect(),
            image_selector: DEFAULT_IMAGE_SELECTOR.to_owned(),
            scroll_debounce_ms: SCROLL_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Lay `options` over the defaults.
    #[must_use]
    pub fn merged(options: Options) -> Self {
        let defaults = Self::default();

        let merge_styles = |given: Option<StyleMap>, default: StyleMap| match given {
            Some(given) => given.with_defaults(&default),
            None => default,
        };

        let mut toolbar_buttons = defaults.toolbar_buttons;
        toolbar_buttons.extend(by_alignment(options.toolbar_buttons.unwrap_or_default(), "toolbarButtons"));

        let mut toolbar_button_styles = defaults.toolbar_button_styles;
        let given_styles = options.toolbar_button_styles.unwrap_or_default();
        for (alignment, styles) in by_alignment(given_styles, "toolbarButtonStyles") {
            let merged = match toolbar_button_styles.get(&alignment) {
                Some(default) => styles.with_defaults(default),
                None => styles,
            };
            toolbar_button_styles.insert(alignment, merged);
        }

        Self {
            overlay_styles: merge_styles(options.overlay_styles, defaults.overlay_styles),
            handle_styles: merge_styles(options.handle_styles, defaults.handle_styles),
            show_size_label: options.show_size_label.unwrap_or(defaults.show_size_label),
            size_label_styles: merge_styles(options.size_label_styles, defaults.size_label_styles),
            show_toolbar: options.show_toolbar.unwrap_or(defaults.show_toolbar),
            toolbar_buttons,
            toolbar_styles: merge_styles(options.toolbar_styles, defaults.toolbar_styles),
            toolbar_button_styles,
            modules: options.modules.unwrap_or(defaults.modules),
            image_selector: options.image_selector.unwrap_or(defaults.image_selector),
            scroll_debounce_ms: options.scroll_debounce_ms.unwrap_or(defaults.scroll_debounce_ms),
        }
    }

    /// Parse caller options from JSON and merge them over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Options`] if the JSON does not describe valid options.
    pub fn from_json(json: &str) -> Result<Self, ResizeError> {
        Ok(Self::merged(Options::from_json(json)?))
    }

    /// Whether the toolbar offers `alignment`.
    #[must_use]
    pub fn button_enabled(&self, alignment: Alignment) -> bool {
        self.toolbar_buttons.get(&alignment).copied().unwrap_or(false)
    }
}
