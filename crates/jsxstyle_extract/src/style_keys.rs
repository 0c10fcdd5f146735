use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::value::{format_number, Value};

const PSEUDO_ELEMENTS: &[&str] = &[
  "after",
  "before",
  "firstLetter",
  "firstLine",
  "placeholder",
  "selection",
];

// `empty` and `enabled` are left out so `emptyCells` keeps working.
const PSEUDO_CLASSES: &[&str] = &[
  "active",
  "checked",
  "disabled",
  "focusVisible",
  "focusWithin",
  "focus",
  "hover",
  "invalid",
  "link",
  "required",
  "target",
  "valid",
  "visited",
];

const UNITLESS_PROPERTIES: &[&str] = &[
  "animation-iteration-count",
  "border-image-outset",
  "border-image-slice",
  "border-image-width",
  "box-flex",
  "box-flex-group",
  "box-ordinal-group",
  "column-count",
  "columns",
  "fill-opacity",
  "flex",
  "flex-grow",
  "flex-negative",
  "flex-order",
  "flex-positive",
  "flex-shrink",
  "flood-opacity",
  "font-weight",
  "grid-area",
  "grid-column",
  "grid-column-end",
  "grid-column-span",
  "grid-column-start",
  "grid-row",
  "grid-row-end",
  "grid-row-span",
  "grid-row-start",
  "line-clamp",
  "line-height",
  "opacity",
  "order",
  "orphans",
  "stop-opacity",
  "stroke-dasharray",
  "stroke-dashoffset",
  "stroke-miterlimit",
  "stroke-opacity",
  "stroke-width",
  "tab-size",
  "widows",
  "z-index",
  "zoom",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StyleKeyError {
  #[error("`{prop}` must be a string, number, boolean or null")]
  InvalidValue { prop: String },
  #[error("`{prop}` uses the breakpoint `{alias}` which has no media query")]
  MissingMediaQuery { prop: String, alias: String },
}

/// A prop name split into its parts, e.g. `smHoverColor` with an `sm` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPropName {
  pub media_alias: Option<String>,
  pub pseudo_element: Option<&'static str>,
  pub pseudo_class: Option<&'static str>,
  /// Hyphenated CSS property.
  pub property: String,
}

/// Which rule a declaration belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector {
  pub media_query: Option<String>,
  pub pseudo_class: Option<String>,
  pub pseudo_element: Option<String>,
}

impl Selector {
  /// Selector text for `class_name`, without the media wrapper.
  pub fn to_css(&self, class_name: &str) -> String {
    let mut out = format!(".{class_name}");
    if let Some(pseudo_class) = &self.pseudo_class {
      out.push(':');
      out.push_str(pseudo_class);
    }
    if let Some(pseudo_element) = &self.pseudo_element {
      out.push_str("::");
      out.push_str(pseudo_element);
    }
    out
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
  pub selector: Selector,
  /// `(property, value)` pairs, sorted case-insensitively by property.
  pub declarations: Vec<(String, String)>,
}

/// Rules produced together for one class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
  pub rules: Vec<RuleRecord>,
  /// Canonical serialization, used as the cache key.
  pub key: String,
}

/// Strip `prefix` from `name` when it is followed by an uppercase letter.
fn strip_word_prefix<'n>(name: &'n str, prefix: &str) -> Option<&'n str> {
  let rest = name.strip_prefix(prefix)?;
  rest
    .starts_with(|c: char| c.is_ascii_uppercase())
    .then_some(rest)
}

fn lower_first(value: &str) -> String {
  let mut chars = value.chars();
  match chars.next() {
    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
    None => String::new(),
  }
}

fn find_pseudo(vocabulary: &[&'static str], rest: &str) -> Option<(&'static str, String)> {
  vocabulary.iter().find_map(|pseudo| {
    strip_word_prefix(rest, pseudo).map(|stripped| (*pseudo, lower_first(stripped)))
  })
}

/// `backgroundColor` → `background-color`, `WebkitTransition` → `-webkit-transition`,
/// `msFlex` → `-ms-flex`.
pub fn hyphenate(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  for c in name.chars() {
    if c.is_ascii_uppercase() {
      out.push('-');
      out.push(c.to_ascii_lowercase());
    } else {
      out.push(c);
    }
  }
  if out.starts_with("ms-") {
    out.insert(0, '-');
  }
  out
}

fn is_unitless(property: &str) -> bool {
  let unprefixed = ["-webkit-", "-moz-", "-ms-", "-o-"]
    .iter()
    .find_map(|prefix| property.strip_prefix(prefix))
    .unwrap_or(property);
  UNITLESS_PROPERTIES.binary_search(&unprefixed).is_ok()
}

/// Decompose a style prop name: breakpoint alias first, then pseudo-element, then pseudo-class,
/// then the base property.
pub fn parse_prop_name<'q>(
  name: &str,
  media_aliases: impl IntoIterator<Item = &'q String>,
) -> ParsedPropName {
  let mut aliases: Vec<&String> = media_aliases.into_iter().collect();
  aliases.sort_by(|a, b| b.len().cmp(&a.len()));

  let mut rest = name.to_string();
  let mut media_alias = None;
  for alias in aliases {
    if let Some(stripped) = strip_word_prefix(&rest, alias) {
      media_alias = Some(alias.clone());
      rest = lower_first(stripped);
      break;
    }
  }

  let mut pseudo_element = None;
  let mut pseudo_class = None;
  if let Some((pseudo, stripped)) = find_pseudo(PSEUDO_ELEMENTS, &rest) {
    pseudo_element = Some(pseudo);
    rest = stripped;
  } else if let Some((pseudo, stripped)) = find_pseudo(PSEUDO_CLASSES, &rest) {
    pseudo_class = Some(pseudo);
    rest = stripped;
  }

  ParsedPropName {
    media_alias,
    pseudo_element,
    pseudo_class,
    property: hyphenate(&rest),
  }
}

/// CSS text for a scalar value. `None` means the declaration is omitted.
pub fn format_value(property: &str, value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::Num(number) if *number != 0.0 && !is_unitless(property) => {
      Some(format!("{}px", format_number(*number)))
    }
    Value::Object(_) | Value::Array(_) => None,
    scalar => scalar.to_js_string(),
  }
}

/// Build the rule group for a bag of constant style props. Returns `None` when every
/// declaration was omitted.
pub fn build_rule_group(
  props: &IndexMap<String, Value>,
  media_queries: &IndexMap<String, String>,
) -> Result<Option<RuleGroup>, StyleKeyError> {
  let mut rules: BTreeMap<Selector, Vec<(String, String)>> = BTreeMap::new();
  let mut key_parts: Vec<(String, String)> = Vec::new();

  for (name, value) in props {
    if !value.is_scalar() {
      return Err(StyleKeyError::InvalidValue { prop: name.clone() });
    }

    let parsed = parse_prop_name(name, media_queries.keys());
    let Some(formatted) = format_value(&parsed.property, value) else {
      continue;
    };

    let media_query = match &parsed.media_alias {
      Some(alias) => match media_queries.get(alias).filter(|query| !query.is_empty()) {
        Some(query) => Some(query.clone()),
        None => {
          return Err(StyleKeyError::MissingMediaQuery {
            prop: name.clone(),
            alias: alias.clone(),
          })
        }
      },
      None => None,
    };

    let key_name = match &media_query {
      Some(query) => format!("{name}@{query}"),
      None => name.clone(),
    };
    key_parts.push((key_name, formatted.clone()));

    let selector = Selector {
      media_query,
      pseudo_class: parsed.pseudo_class.map(String::from),
      pseudo_element: parsed.pseudo_element.map(|pseudo| hyphenate(pseudo)),
    };
    rules
      .entry(selector)
      .or_default()
      .push((parsed.property, formatted));
  }

  if key_parts.is_empty() {
    return Ok(None);
  }

  key_parts.sort_by_cached_key(|(name, _)| (name.to_ascii_lowercase(), name.clone()));
  let key = key_parts
    .iter()
    .map(|(name, value)| format!("{name}:{value};"))
    .collect::<String>();

  let rules = rules
    .into_iter()
    .map(|(selector, mut declarations)| {
      declarations.sort_by_cached_key(|(property, _)| (property.to_ascii_lowercase(), property.clone()));
      RuleRecord {
        selector,
        declarations,
      }
    })
    .collect();

  Ok(Some(RuleGroup { rules, key }))
}
