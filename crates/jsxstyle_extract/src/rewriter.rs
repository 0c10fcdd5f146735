use std::collections::HashSet;

use indexmap::IndexMap;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
  Expr, Ident, IdentName, JSXAttr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXElement,
  JSXElementName, Lit,
};

use crate::attributes::{
  attr_expr, attr_name, classify_attributes, collect_extractable, has_unresolved_spread,
  AttributeKind, AttributeRecord, ReservedProp, StyleValue,
};
use crate::cache::{CacheState, ClassNaming};
use crate::catalog::CatalogEntry;
use crate::class_name::{
  compose_class_value, is_rereadable, merge_spread_classes, ClassVariant, ExistingClass,
};
use crate::config::{ExtractOptions, StyleGroup};
use crate::errors::WarningSink;
use crate::evaluator::{ConditionalValue, Evaluator};
use crate::hoist::{const_declaration, DeclarationPositions, HoistFrame, UsedNames};
use crate::reserved::{analyze_component, analyze_media_queries, analyze_props, ComponentTarget};
use crate::style_keys::{build_rule_group, parse_prop_name, RuleGroup};
use crate::stylesheet::{Provenance, StylesheetBuffer};
use crate::value::Value;

/// What happened to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
  /// Nothing could be extracted; the element is left to the runtime.
  Untouched,
  /// Some styles moved to classes, the rest stays on the component.
  Partial,
  /// Every prop was resolved and the element became a plain element.
  Static,
}

/// Room to bind a conditional `component` value in front of the enclosing statement.
pub struct HoistSlot<'s> {
  pub frame: &'s mut HoistFrame,
  pub positions: &'s DeclarationPositions,
  pub names: &'s mut UsedNames,
}

/// Where an element sits and what it stands for.
pub struct ElementSite<'s> {
  pub entry: &'s CatalogEntry,
  pub start_line: usize,
  pub end_line: usize,
  /// Component local a lite-mode tag becomes when the element is not fully static.
  pub lite_local: Option<&'s Ident>,
  pub hoist: Option<HoistSlot<'s>>,
}

struct VariantProps {
  condition: ConditionalValue,
  consequent: IndexMap<String, Value>,
  alternate: IndexMap<String, Value>,
}

struct VariantRules {
  test: Box<Expr>,
  consequent: Option<RuleGroup>,
  alternate: Option<RuleGroup>,
}

enum GroupMatch {
  Matched(IndexMap<String, Value>),
  Invalid,
  NoMatch,
}

/// Everything decided about an element before it is touched.
struct Plan {
  full_static: bool,
  records: Vec<AttributeRecord>,
  extracted: HashSet<usize>,
  component: Option<ComponentTarget>,
  props_index: Option<usize>,
  expanded_props: Option<Vec<JSXAttrOrSpread>>,
  class_index: Option<usize>,
  class_attribute: String,
  existing: Option<ExistingClass>,
  /// Spreads after the class attribute whose own class has to be kept.
  later_spreads: Vec<Box<Expr>>,
  groups: Vec<(Option<String>, RuleGroup)>,
  base: Option<RuleGroup>,
  variants: Vec<VariantRules>,
}

fn jsx_attr(attrs: &[JSXAttrOrSpread], index: usize) -> Option<&JSXAttr> {
  match attrs.get(index)? {
    JSXAttrOrSpread::JSXAttr(attr) => Some(attr),
    JSXAttrOrSpread::SpreadElement(_) => None,
  }
}

/// Position of the last attribute for `prop`, since the last one wins at runtime.
fn reserved_index(records: &[AttributeRecord], wanted: ReservedProp) -> Option<usize> {
  records.iter().rev().find_map(|record| match record.kind {
    AttributeKind::Reserved { prop, .. } if prop == wanted => Some(record.index),
    _ => None,
  })
}

fn match_style_group(group: &StyleGroup, constants: &IndexMap<String, Value>) -> GroupMatch {
  if group.is_empty() {
    return GroupMatch::NoMatch;
  }
  let props: IndexMap<String, Value> = group
    .iter()
    .map(|(key, value)| (key.clone(), Value::from(value)))
    .collect();
  let present = |(key, value): (&String, &Value)| {
    constants
      .get(key)
      .and_then(|constant| constant.strict_eq(value))
      .unwrap_or(false)
  };

  if props.values().all(Value::is_scalar) {
    if props.iter().all(present) {
      GroupMatch::Matched(props)
    } else {
      GroupMatch::NoMatch
    }
  } else {
    let mut scalars = props.iter().filter(|(_, value)| value.is_scalar()).peekable();
    if scalars.peek().is_some() && scalars.all(present) {
      GroupMatch::Invalid
    } else {
      GroupMatch::NoMatch
    }
  }
}

fn class_attr(name: &str, value: JSXAttrValue) -> JSXAttrOrSpread {
  JSXAttrOrSpread::JSXAttr(JSXAttr {
    span: DUMMY_SP,
    name: JSXAttrName::Ident(IdentName::new(name.into(), DUMMY_SP)),
    value: Some(value),
  })
}

fn plain_tag(entry: &CatalogEntry) -> JSXElementName {
  JSXElementName::Ident(Ident::new(
    entry.tag.as_str().into(),
    DUMMY_SP,
    SyntaxContext::empty(),
  ))
}

fn rename(element: &mut JSXElement, name: JSXElementName) {
  if let Some(closing) = &mut element.closing {
    closing.name = name.clone();
  }
  element.opening.name = name;
}

/// Per-file rewriting of style component elements.
pub struct ElementRewriter<'a> {
  options: &'a ExtractOptions,
  naming: ClassNaming,
  cache: &'a mut CacheState,
  stylesheet: StylesheetBuffer,
  warnings: WarningSink,
  source_file: String,
}

impl<'a> ElementRewriter<'a> {
  pub fn new(source_file: &str, options: &'a ExtractOptions, cache: &'a mut CacheState) -> Self {
    Self {
      options,
      naming: options.class_naming(),
      cache,
      stylesheet: StylesheetBuffer::new(),
      warnings: WarningSink::new(source_file, options.error_callback.clone()),
      source_file: source_file.to_string(),
    }
  }

  pub fn into_parts(self) -> (StylesheetBuffer, WarningSink) {
    (self.stylesheet, self.warnings)
  }

  /// Extract what can be extracted from `element` and rewrite it in place.
  pub fn rewrite(
    &mut self,
    element: &mut JSXElement,
    mut site: ElementSite<'_>,
    evaluator: &Evaluator<'_>,
  ) -> RewriteOutcome {
    let outcome = match self.plan(&element.opening.attrs, &site, evaluator) {
      Some(plan) => self.apply(element, &mut site, plan),
      None => RewriteOutcome::Untouched,
    };
    if outcome != RewriteOutcome::Static {
      if let Some(local) = site.lite_local {
        rename(element, JSXElementName::Ident(local.clone()));
      }
    }

    tracing::trace!(
      component = %site.entry.name,
      line = site.start_line,
      ?outcome,
      "Rewrote element"
    );
    outcome
  }

  fn plan(
    &mut self,
    attrs: &[JSXAttrOrSpread],
    site: &ElementSite<'_>,
    evaluator: &Evaluator<'_>,
  ) -> Option<Plan> {
    let line = site.start_line;
    let records = classify_attributes(attrs, evaluator, &mut self.warnings, line);

    let class_indices: Vec<usize> = records
      .iter()
      .filter(|record| {
        matches!(
          record.kind,
          AttributeKind::Reserved {
            prop: ReservedProp::ClassName,
            ..
          }
        )
      })
      .map(|record| record.index)
      .collect();
    if class_indices.len() > 1 {
      tracing::trace!(line, "Element has more than one class attribute");
      return None;
    }
    let class_index = class_indices.first().copied();

    let mut media_queries = self.options.media_queries.clone();
    let media_queries_attr = reserved_index(&records, ReservedProp::MediaQueries)
      .and_then(|index| jsx_attr(attrs, index));
    if let Some(attr) = media_queries_attr {
      match analyze_media_queries(&attr.value, evaluator) {
        Some(aliases) => media_queries.extend(aliases),
        None => {
          self.warnings.warn(
            "The `mediaQueries` prop could not be resolved at build time; the element is left to the runtime",
            line,
          );
          return None;
        }
      }
    }

    let component = reserved_index(&records, ReservedProp::Component)
      .and_then(|index| jsx_attr(attrs, index))
      .map(|attr| analyze_component(&attr.value, evaluator, &mut self.warnings, line));
    let props_index = reserved_index(&records, ReservedProp::Props);
    let expanded_props = props_index
      .and_then(|index| jsx_attr(attrs, index))
      .and_then(|attr| analyze_props(&attr.value, &mut self.warnings, line));

    let styles = collect_extractable(&records, |name| {
      parse_prop_name(name, media_queries.keys())
        .media_alias
        .is_some()
    });

    let component_static = match &component {
      None | Some(ComponentTarget::Tag(_)) => true,
      Some(ComponentTarget::Hoist(expr)) => site.hoist.as_ref().is_some_and(|slot| {
        slot
          .positions
          .all_declared_before(expr, slot.frame.statement_start)
      }),
      Some(ComponentTarget::Opaque) => false,
    };
    let full_static = !has_unresolved_spread(&records)
      && styles.covers_all(&records)
      && component_static
      && (props_index.is_none() || expanded_props.is_some())
      && !records
        .iter()
        .any(|record| matches!(record.kind, AttributeKind::Namespaced));

    let mut constants = if full_static {
      site.entry.kind.defaults()
    } else {
      IndexMap::new()
    };
    let mut variant_props: Vec<VariantProps> = Vec::new();
    for (name, value) in &styles.values {
      constants.shift_remove(name);
      match value {
        StyleValue::Constant(value) => {
          constants.insert(name.clone(), value.clone());
        }
        StyleValue::Conditional(conditional) => {
          let position = variant_props
            .iter()
            .position(|variant| variant.condition.same_condition(conditional));
          let variant = match position {
            Some(position) => &mut variant_props[position],
            None => {
              variant_props.push(VariantProps {
                condition: conditional.clone(),
                consequent: IndexMap::new(),
                alternate: IndexMap::new(),
              });
              let last = variant_props.len() - 1;
              &mut variant_props[last]
            }
          };
          variant
            .consequent
            .insert(name.clone(), conditional.consequent.clone());
          variant
            .alternate
            .insert(name.clone(), conditional.alternate.clone());
        }
      }
    }
    constants.retain(|_, value| !value.is_null());

    let positional = self
      .options
      .style_groups
      .iter()
      .enumerate()
      .map(|(index, group)| (None, index.to_string(), group));
    let named = self
      .options
      .named_style_groups
      .iter()
      .map(|(name, group)| (Some(name.clone()), name.clone(), group));
    let mut groups = Vec::new();
    for (name, label, group) in positional.chain(named) {
      match match_style_group(group, &constants) {
        GroupMatch::NoMatch => {}
        GroupMatch::Invalid => self.warnings.warn(
          format!("Style group `{label}` contains values that are not literals and was skipped"),
          line,
        ),
        GroupMatch::Matched(props) => match build_rule_group(&props, &media_queries) {
          Ok(Some(rules)) => {
            for key in props.keys() {
              constants.shift_remove(key);
            }
            groups.push((name, rules));
          }
          Ok(None) => {}
          Err(error) => self
            .warnings
            .warn(format!("Style group `{label}` was skipped: {error}"), line),
        },
      }
    }

    let base = match build_rule_group(&constants, &media_queries) {
      Ok(base) => base,
      Err(error) => {
        self.warnings.warn(error.to_string(), line);
        return None;
      }
    };

    let mut variants = Vec::with_capacity(variant_props.len());
    for variant in variant_props {
      let consequent = build_rule_group(&variant.consequent, &media_queries);
      let alternate = build_rule_group(&variant.alternate, &media_queries);
      match (consequent, alternate) {
        (Ok(consequent), Ok(alternate)) => {
          if consequent.is_some() || alternate.is_some() {
            variants.push(VariantRules {
              test: variant.condition.test,
              consequent,
              alternate,
            });
          }
        }
        (Err(error), _) | (_, Err(error)) => {
          self.warnings.warn(error.to_string(), line);
          return None;
        }
      }
    }

    if !full_static && groups.is_empty() && base.is_none() && variants.is_empty() {
      return None;
    }

    let class_attr_value = class_index.and_then(|index| jsx_attr(attrs, index));
    let class_attribute = class_attr_value
      .and_then(attr_name)
      .unwrap_or(self.options.lite_mode.class_attribute())
      .to_string();
    let existing = match class_attr_value {
      None => None,
      Some(attr) => match &attr.value {
        Some(JSXAttrValue::Lit(Lit::Str(value))) => {
          Some(ExistingClass::Literal(value.value.to_string()))
        }
        value => {
          let expr = attr_expr(value)?;
          match evaluator.evaluate_constant(expr) {
            Some(Value::Str(value)) => Some(ExistingClass::Literal(value)),
            Some(Value::Null) => None,
            _ => Some(ExistingClass::Dynamic(Box::new(expr.clone()))),
          }
        }
      },
    }
    .filter(|existing| !matches!(existing, ExistingClass::Literal(value) if value.is_empty()));

    let mut later_spreads = Vec::new();
    if !full_static {
      for record in &records {
        let after_class = class_index.map_or(true, |class_index| record.index > class_index);
        if !matches!(record.kind, AttributeKind::Spread) || !after_class {
          continue;
        }
        let Some(JSXAttrOrSpread::SpreadElement(spread)) = attrs.get(record.index) else {
          continue;
        };
        if !is_rereadable(&spread.expr) {
          tracing::trace!(line, "Spread cannot be read twice; element left to the runtime");
          return None;
        }
        later_spreads.push(spread.expr.clone());
      }
    }

    Some(Plan {
      full_static,
      records,
      extracted: styles.extracted_indices,
      component,
      props_index,
      expanded_props,
      class_index,
      class_attribute,
      existing,
      later_spreads,
      groups,
      base,
      variants,
    })
  }

  fn register(
    &mut self,
    rules: &RuleGroup,
    name: Option<&str>,
    provenance: &Provenance<'_>,
  ) -> String {
    let class_name = match name {
      Some(name) => self.cache.assign_named(&rules.key, name),
      None => self.cache.assign(&rules.key, &self.naming),
    };
    self.stylesheet.add(&class_name, &rules.rules, provenance);
    class_name
  }

  fn apply(
    &mut self,
    element: &mut JSXElement,
    site: &mut ElementSite<'_>,
    plan: Plan,
  ) -> RewriteOutcome {
    let entry = site.entry;
    let source_file = self.source_file.clone();
    let provenance = Provenance {
      source_file: &source_file,
      start_line: site.start_line,
      end_line: site.end_line,
      display_name: &entry.name,
    };

    let mut statics = Vec::new();
    for (name, rules) in &plan.groups {
      statics.push(self.register(rules, name.as_deref(), &provenance));
    }
    if let Some(base) = &plan.base {
      statics.push(self.register(base, None, &provenance));
    }
    let mut variants = Vec::with_capacity(plan.variants.len());
    for variant in &plan.variants {
      let consequent = variant
        .consequent
        .as_ref()
        .map(|rules| self.register(rules, None, &provenance));
      let alternate = variant
        .alternate
        .as_ref()
        .map(|rules| self.register(rules, None, &provenance));
      variants.push(ClassVariant {
        test: variant.test.clone(),
        consequent,
        alternate,
      });
    }

    let existing = if plan.later_spreads.is_empty() {
      plan.existing
    } else {
      merge_spread_classes(
        &plan.later_spreads,
        &plan.class_attribute,
        plan.existing.map(ExistingClass::into_expr),
      )
      .map(ExistingClass::Dynamic)
    };
    let mut class_value = compose_class_value(existing, &statics, &variants);

    let attrs = std::mem::take(&mut element.opening.attrs);
    let mut new_attrs = Vec::with_capacity(attrs.len() + 1);

    if plan.full_static {
      let mut expanded_props = plan.expanded_props;
      for (index, attr) in attrs.into_iter().enumerate() {
        match plan.records.get(index).map(|record| &record.kind) {
          Some(AttributeKind::Reserved {
            prop: ReservedProp::Key | ReservedProp::Ref | ReservedProp::Children | ReservedProp::Style,
            ..
          }) => new_attrs.push(attr),
          Some(AttributeKind::Reserved {
            prop: ReservedProp::Props,
            ..
          }) if plan.props_index == Some(index) => {
            new_attrs.extend(expanded_props.take().unwrap_or_default());
          }
          _ => {}
        }
      }
      if let Some(value) = class_value {
        new_attrs.push(class_attr(&plan.class_attribute, value));
      }
      element.opening.attrs = new_attrs;

      let name = match plan.component {
        Some(ComponentTarget::Tag(name)) => name,
        Some(ComponentTarget::Hoist(expr)) => match site.hoist.as_mut() {
          Some(slot) => {
            let local = slot.names.fresh_ident("Component");
            slot.frame.pending.push(const_declaration(local.clone(), expr));
            JSXElementName::Ident(local)
          }
          None => plain_tag(entry),
        },
        Some(ComponentTarget::Opaque) | None => plain_tag(entry),
      };
      rename(element, name);
      return RewriteOutcome::Static;
    }

    let moved = !plan.later_spreads.is_empty();
    for (index, attr) in attrs.into_iter().enumerate() {
      if plan.extracted.contains(&index) {
        continue;
      }
      if plan.class_index == Some(index) {
        if !moved {
          if let Some(value) = class_value.take() {
            new_attrs.push(class_attr(&plan.class_attribute, value));
          }
        }
        continue;
      }
      new_attrs.push(attr);
    }
    if let Some(value) = class_value {
      new_attrs.push(class_attr(&plan.class_attribute, value));
    }
    element.opening.attrs = new_attrs;
    RewriteOutcome::Partial
  }
}
