use std::collections::HashSet;

use indexmap::IndexMap;
use swc_core::ecma::ast::{Expr, JSXAttr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXExpr, Lit};

use crate::errors::WarningSink;
use crate::evaluator::{ConditionalValue, Evaluation, Evaluator};
use crate::value::Value;

/// Props with a meaning of their own. They are never turned into styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedProp {
  Key,
  Ref,
  ClassName,
  Style,
  Props,
  Component,
  MediaQueries,
  Children,
}

impl ReservedProp {
  pub fn from_name(name: &str) -> Option<Self> {
    Some(match name {
      "key" => ReservedProp::Key,
      "ref" => ReservedProp::Ref,
      "className" | "class" => ReservedProp::ClassName,
      "style" => ReservedProp::Style,
      "props" => ReservedProp::Props,
      "component" => ReservedProp::Component,
      "mediaQueries" => ReservedProp::MediaQueries,
      "children" => ReservedProp::Children,
      _ => return None,
    })
  }
}

#[derive(Debug, Clone)]
pub enum AttributeKind {
  Style {
    name: String,
    evaluation: Evaluation,
  },
  Reserved {
    prop: ReservedProp,
    name: String,
  },
  /// A spread whose argument folds to a constant object of style props.
  TrustedSpread {
    entries: IndexMap<String, Value>,
  },
  /// A spread only known at runtime. Nothing after it may be extracted.
  Spread,
  /// `xlink:href` and friends. Always kept.
  Namespaced,
}

#[derive(Debug, Clone)]
pub struct AttributeRecord {
  /// Position in the element's attribute list.
  pub index: usize,
  pub kind: AttributeKind,
  /// Positioned after an unresolved spread.
  pub frozen: bool,
}

/// Value of a JSX attribute as an expression, if it has one.
pub fn attr_expr(value: &Option<JSXAttrValue>) -> Option<&Expr> {
  match value {
    Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
      JSXExpr::Expr(expr) => Some(expr),
      JSXExpr::JSXEmptyExpr(_) => None,
    },
    _ => None,
  }
}

pub fn attr_name(attr: &JSXAttr) -> Option<&str> {
  match &attr.name {
    JSXAttrName::Ident(name) => Some(&*name.sym),
    JSXAttrName::JSXNamespacedName(_) => None,
  }
}

fn evaluate_attr_value(value: &Option<JSXAttrValue>, evaluator: &Evaluator<'_>) -> Evaluation {
  match value {
    None => Evaluation::Constant(Value::Bool(true)),
    Some(JSXAttrValue::Lit(Lit::Str(value))) => Evaluation::Constant(Value::Str(value.value.to_string())),
    Some(JSXAttrValue::Lit(_)) => Evaluation::Opaque,
    Some(JSXAttrValue::JSXExprContainer(_)) => match attr_expr(value) {
      Some(expr) => evaluator.evaluate(expr),
      None => Evaluation::Opaque,
    },
    Some(JSXAttrValue::JSXElement(_)) | Some(JSXAttrValue::JSXFragment(_)) => Evaluation::Opaque,
  }
}

/// Classify every attribute of an element, in source order.
pub fn classify_attributes(
  attrs: &[JSXAttrOrSpread],
  evaluator: &Evaluator<'_>,
  warnings: &mut WarningSink,
  line: usize,
) -> Vec<AttributeRecord> {
  let mut frozen = false;
  let mut records = Vec::with_capacity(attrs.len());

  for (index, attr) in attrs.iter().enumerate() {
    let kind = match attr {
      JSXAttrOrSpread::SpreadElement(spread) => {
        match evaluator.evaluate_constant(&spread.expr) {
          Some(Value::Object(entries)) => {
            let reserved: Vec<&String> = entries
              .keys()
              .filter(|key| ReservedProp::from_name(key).is_some())
              .collect();
            if !reserved.is_empty() {
              warnings.warn(
                format!(
                  "Spread object contains the reserved prop `{}` and cannot be merged into the extracted styles",
                  reserved[0]
                ),
                line,
              );
              AttributeKind::Spread
            } else if entries.values().all(Value::is_scalar) {
              AttributeKind::TrustedSpread { entries }
            } else {
              AttributeKind::Spread
            }
          }
          _ => AttributeKind::Spread,
        }
      }
      JSXAttrOrSpread::JSXAttr(attr) => match attr_name(attr) {
        None => AttributeKind::Namespaced,
        Some(name) => match ReservedProp::from_name(name) {
          Some(prop) => AttributeKind::Reserved {
            prop,
            name: name.to_string(),
          },
          None => AttributeKind::Style {
            name: name.to_string(),
            evaluation: evaluate_attr_value(&attr.value, evaluator),
          },
        },
      },
    };

    let is_spread = matches!(kind, AttributeKind::Spread);
    records.push(AttributeRecord {
      index,
      kind,
      frozen,
    });
    if is_spread {
      frozen = true;
    }
  }

  records
}

pub fn has_unresolved_spread(records: &[AttributeRecord]) -> bool {
  records
    .iter()
    .any(|record| matches!(record.kind, AttributeKind::Spread))
}

/// A style value after duplicate resolution.
#[derive(Debug, Clone)]
pub enum StyleValue {
  Constant(Value),
  Conditional(ConditionalValue),
}

/// Style props that can leave the element, plus the attribute positions to remove.
#[derive(Debug, Default)]
pub struct ExtractableStyles {
  pub values: IndexMap<String, StyleValue>,
  pub extracted_indices: HashSet<usize>,
}

impl ExtractableStyles {
  /// Whether every style attribute of the element made it in.
  pub fn covers_all(&self, records: &[AttributeRecord]) -> bool {
    records.iter().all(|record| match record.kind {
      AttributeKind::Style { .. } | AttributeKind::TrustedSpread { .. } => {
        self.extracted_indices.contains(&record.index)
      }
      _ => true,
    })
  }
}

/// Collect the style props that are safe to extract.
///
/// A prop is extracted only if every occurrence of its name (attributes and trusted spread
/// entries) is extractable, since the last occurrence wins at runtime. A trusted spread is
/// removed only when all of its entries are extracted. Breakpoint-prefixed props are kept when
/// an unresolved spread could bring its own `mediaQueries`.
pub fn collect_extractable(
  records: &[AttributeRecord],
  is_aliased: impl Fn(&str) -> bool,
) -> ExtractableStyles {
  let spread_present = has_unresolved_spread(records);
  let extractable_value = |evaluation: &Evaluation| match evaluation {
    Evaluation::Constant(value) if value.is_scalar() => Some(StyleValue::Constant(value.clone())),
    Evaluation::Conditional(conditional) => Some(StyleValue::Conditional(conditional.clone())),
    _ => None,
  };

  let mut excluded: HashSet<String> = HashSet::new();
  for record in records {
    if let AttributeKind::Style { name, evaluation } = &record.kind {
      let blocked = record.frozen
        || extractable_value(evaluation).is_none()
        || (spread_present && is_aliased(name));
      if blocked {
        excluded.insert(name.clone());
      }
    }
    if let AttributeKind::TrustedSpread { entries } = &record.kind {
      if record.frozen {
        excluded.extend(entries.keys().cloned());
      }
      if spread_present {
        excluded.extend(entries.keys().filter(|key| is_aliased(key)).cloned());
      }
    }
  }

  // A trusted spread with one excluded entry stays on the element, which excludes the rest of
  // its entries too.
  let mut kept_spreads: HashSet<usize> = HashSet::new();
  loop {
    let mut changed = false;
    for record in records {
      if let AttributeKind::TrustedSpread { entries } = &record.kind {
        if !kept_spreads.contains(&record.index) && entries.keys().any(|key| excluded.contains(key))
        {
          kept_spreads.insert(record.index);
          for key in entries.keys() {
            changed |= excluded.insert(key.clone());
          }
        }
      }
    }
    if !changed {
      break;
    }
  }

  let mut styles = ExtractableStyles::default();
  for record in records {
    match &record.kind {
      AttributeKind::Style { name, evaluation } if !excluded.contains(name) => {
        if let Some(value) = extractable_value(evaluation) {
          styles.values.shift_remove(name);
          styles.values.insert(name.clone(), value);
          styles.extracted_indices.insert(record.index);
        }
      }
      AttributeKind::TrustedSpread { entries } if !kept_spreads.contains(&record.index) => {
        for (name, value) in entries {
          styles.values.shift_remove(name);
          styles
            .values
            .insert(name.clone(), StyleValue::Constant(value.clone()));
        }
        styles.extracted_indices.insert(record.index);
      }
      _ => {}
    }
  }
  styles
}
