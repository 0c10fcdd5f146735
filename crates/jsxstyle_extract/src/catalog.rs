use indexmap::IndexMap;
use inflector::cases::pascalcase::to_pascal_case;

use crate::config::ExtractOptions;
use crate::value::Value;

/// Layout preset of a style component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
  Block,
  InlineBlock,
  Row,
  Col,
  /// No preset, e.g. `Box`.
  Generic,
  Custom(IndexMap<String, Value>),
}

impl ComponentKind {
  /// Style props implied by the preset, in the order they are merged under explicit props.
  pub fn defaults(&self) -> IndexMap<String, Value> {
    let pairs: Vec<(&str, &str)> = match self {
      ComponentKind::Block => vec![("display", "block")],
      ComponentKind::InlineBlock => vec![("display", "inline-block")],
      ComponentKind::Row => vec![("display", "flex"), ("flexDirection", "row")],
      ComponentKind::Col => vec![("display", "flex"), ("flexDirection", "column")],
      ComponentKind::Generic => vec![],
      ComponentKind::Custom(styles) => return styles.clone(),
    };
    pairs
      .into_iter()
      .map(|(key, value)| (key.to_string(), Value::Str(value.to_string())))
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
  /// Exported name, used as the display name in stylesheet comments.
  pub name: String,
  pub kind: ComponentKind,
  /// Plain element the component becomes when every prop is static.
  pub tag: String,
}

/// Known style components, keyed by exported name.
#[derive(Debug, Clone)]
pub struct Catalog {
  entries: IndexMap<String, CatalogEntry>,
}

fn custom(pairs: &[(&str, &str)]) -> ComponentKind {
  ComponentKind::Custom(
    pairs
      .iter()
      .map(|(key, value)| (key.to_string(), Value::Str(value.to_string())))
      .collect(),
  )
}

impl Catalog {
  pub fn new(options: &ExtractOptions) -> Self {
    let builtin = [
      ("Box", ComponentKind::Generic),
      ("Block", ComponentKind::Block),
      ("InlineBlock", ComponentKind::InlineBlock),
      ("Row", ComponentKind::Row),
      ("Col", ComponentKind::Col),
      ("Inline", custom(&[("display", "inline")])),
      ("Flex", custom(&[("display", "flex")])),
      ("InlineFlex", custom(&[("display", "inline-flex")])),
      (
        "InlineRow",
        custom(&[("display", "inline-flex"), ("flexDirection", "row")]),
      ),
      (
        "InlineCol",
        custom(&[("display", "inline-flex"), ("flexDirection", "column")]),
      ),
      ("Grid", custom(&[("display", "grid")])),
    ];

    let mut entries: IndexMap<String, CatalogEntry> = builtin
      .into_iter()
      .map(|(name, kind)| {
        (
          name.to_string(),
          CatalogEntry {
            name: name.to_string(),
            kind,
            tag: "div".to_string(),
          },
        )
      })
      .collect();

    for (name, component) in &options.components {
      entries.insert(
        name.clone(),
        CatalogEntry {
          name: name.clone(),
          kind: ComponentKind::Custom(
            component
              .styles
              .iter()
              .map(|(key, value)| (key.clone(), Value::from(value)))
              .collect(),
          ),
          tag: component.tag.clone().unwrap_or_else(|| "div".to_string()),
        },
      );
    }

    Self { entries }
  }

  pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
    self.entries.get(name)
  }

  /// Entry for a lowercase kebab-case tag such as `inline-block`.
  pub fn for_lite_tag(&self, tag: &str) -> Option<&CatalogEntry> {
    let is_kebab = !tag.is_empty()
      && tag.starts_with(|c: char| c.is_ascii_lowercase())
      && tag.chars().all(|c| c.is_ascii_lowercase() || c == '-');
    if !is_kebab {
      return None;
    }
    self.get(&to_pascal_case(tag))
  }
}
