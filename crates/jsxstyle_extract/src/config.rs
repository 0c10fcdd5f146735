use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::ClassNaming;

/// Receives recoverable warnings as `(message, source_file, line)`.
pub type ErrorCallback = Arc<dyn Fn(&str, &str, usize) + Send + Sync>;

/// Derives a class name from a canonical declaration serialization.
pub type ClassNameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A literal prop bag, as written in a style group preset.
pub type StyleGroup = IndexMap<String, serde_json::Value>;

/// Lowercase tag names are mapped to style components without an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteMode {
  #[default]
  Off,
  React,
  Preact,
}

impl LiteMode {
  /// Module the synthesized component import points at.
  pub fn import_source(&self) -> Option<&'static str> {
    match self {
      LiteMode::Off => None,
      LiteMode::React => Some("jsxstyle"),
      LiteMode::Preact => Some("jsxstyle/preact"),
    }
  }

  /// Attribute the target runtime reads class names from.
  pub fn class_attribute(&self) -> &'static str {
    match self {
      LiteMode::Preact => "class",
      LiteMode::Off | LiteMode::React => "className",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassNamingMode {
  #[default]
  Counter,
  Hash,
}

/// An extra catalog entry supplied by the host build.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomComponent {
  /// Plain element the component renders when fully static. Defaults to `div`.
  pub tag: Option<String>,
  pub styles: IndexMap<String, serde_json::Value>,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
  pub static_namespace: serde_json::Map<String, serde_json::Value>,
  pub style_groups: Vec<StyleGroup>,
  pub named_style_groups: IndexMap<String, StyleGroup>,
  pub media_queries: IndexMap<String, String>,
  pub whitelisted_modules: Vec<String>,
  pub lite_mode: LiteMode,
  pub module_sources: Vec<String>,
  pub class_name_prefix: String,
  pub class_naming: ClassNamingMode,
  pub extract_logical_or: bool,
  pub stylesheet_suffix: String,
  pub components: IndexMap<String, CustomComponent>,
  #[serde(skip)]
  pub error_callback: Option<ErrorCallback>,
  /// Overrides `class_naming` when set.
  #[serde(skip)]
  pub get_class_name: Option<ClassNameFn>,
}

impl Default for ExtractOptions {
  fn default() -> Self {
    Self {
      static_namespace: serde_json::Map::new(),
      style_groups: Vec::new(),
      named_style_groups: IndexMap::new(),
      media_queries: IndexMap::new(),
      whitelisted_modules: Vec::new(),
      lite_mode: LiteMode::Off,
      module_sources: vec!["jsxstyle".into(), "jsxstyle/preact".into()],
      class_name_prefix: "_x".into(),
      class_naming: ClassNamingMode::Counter,
      extract_logical_or: false,
      stylesheet_suffix: ".jsxstyle.css".into(),
      components: IndexMap::new(),
      error_callback: None,
      get_class_name: None,
    }
  }
}

impl fmt::Debug for ExtractOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExtractOptions")
      .field("static_namespace", &self.static_namespace)
      .field("style_groups", &self.style_groups)
      .field("named_style_groups", &self.named_style_groups)
      .field("media_queries", &self.media_queries)
      .field("whitelisted_modules", &self.whitelisted_modules)
      .field("lite_mode", &self.lite_mode)
      .field("module_sources", &self.module_sources)
      .field("class_name_prefix", &self.class_name_prefix)
      .field("class_naming", &self.class_naming)
      .field("extract_logical_or", &self.extract_logical_or)
      .field("stylesheet_suffix", &self.stylesheet_suffix)
      .field("components", &self.components)
      .field("error_callback", &self.error_callback.is_some())
      .field("get_class_name", &self.get_class_name.is_some())
      .finish()
  }
}

impl ExtractOptions {
  pub fn class_naming(&self) -> ClassNaming {
    if let Some(get_class_name) = &self.get_class_name {
      return ClassNaming::Custom(get_class_name.clone());
    }
    match self.class_naming {
      ClassNamingMode::Counter => ClassNaming::Counter {
        prefix: self.class_name_prefix.clone(),
      },
      ClassNamingMode::Hash => ClassNaming::Hash,
    }
  }

  pub fn is_module_source(&self, source: &str) -> bool {
    self.module_sources.iter().any(|module| module == source)
  }

  pub fn is_whitelisted(&self, source: &str) -> bool {
    self.whitelisted_modules.iter().any(|module| module == source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn deserializes_camel_case_options_with_defaults() {
    let options: ExtractOptions = serde_json::from_str(
      r#"{
        "mediaQueries": { "sm": "screen and (min-width: 640px)" },
        "liteMode": "preact",
        "classNaming": "hash",
        "namedStyleGroups": { "_title": { "fontWeight": "bold" } }
      }"#,
    )
    .unwrap();

    assert_eq!(options.lite_mode, LiteMode::Preact);
    assert_eq!(options.class_naming, ClassNamingMode::Hash);
    assert_eq!(options.class_name_prefix, "_x");
    assert_eq!(options.stylesheet_suffix, ".jsxstyle.css");
    assert_eq!(
      options.media_queries.get("sm").map(String::as_str),
      Some("screen and (min-width: 640px)")
    );
    assert!(options.is_module_source("jsxstyle/preact"));
    assert!(!options.extract_logical_or);
  }

  #[test]
  fn lite_mode_targets() {
    assert_eq!(LiteMode::React.import_source(), Some("jsxstyle"));
    assert_eq!(LiteMode::Preact.class_attribute(), "class");
    assert_eq!(LiteMode::Off.import_source(), None);
  }
}
