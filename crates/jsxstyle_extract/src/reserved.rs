use indexmap::IndexMap;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
  BinExpr, BinaryOp, Expr, Ident, IdentName, JSXAttr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue,
  JSXElementName, JSXExpr, JSXExprContainer, JSXMemberExpr, JSXObject, Lit, MemberExpr, MemberProp,
  Prop, PropName, PropOrSpread, SpreadElement, Str, UnaryExpr, UnaryOp,
};

use crate::attributes::attr_expr;
use crate::errors::WarningSink;
use crate::evaluator::{unwrap_expr, Evaluator};
use crate::value::Value;

/// What a `component` prop turns the element into.
#[derive(Debug, Clone)]
pub enum ComponentTarget {
  Tag(JSXElementName),
  /// A conditional choice between tags. It has to be bound to a local before use.
  Hoist(Box<Expr>),
  Opaque,
}

fn is_intrinsic_tag(name: &str) -> bool {
  name.starts_with(|c: char| c.is_ascii_lowercase())
    && name
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_component_ident(ident: &Ident) -> bool {
  !ident.sym.starts_with(|c: char| c.is_ascii_lowercase())
}

/// `a.b.c` as a JSX member name.
fn member_to_jsx(member: &MemberExpr) -> Option<JSXMemberExpr> {
  let MemberProp::Ident(prop) = &member.prop else {
    return None;
  };
  let obj = match unwrap_expr(&member.obj) {
    Expr::Ident(ident) => JSXObject::Ident(ident.clone()),
    Expr::Member(inner) => JSXObject::JSXMemberExpr(Box::new(member_to_jsx(inner)?)),
    _ => return None,
  };
  Some(JSXMemberExpr {
    span: member.span,
    obj,
    prop: prop.clone(),
  })
}

/// A tag-like expression usable as a JSX element name or a hoisted tag value.
fn tag_name(expr: &Expr) -> Option<JSXElementName> {
  match unwrap_expr(expr) {
    Expr::Lit(Lit::Str(value)) if is_intrinsic_tag(&value.value) => Some(JSXElementName::Ident(
      Ident::new(value.value.clone(), DUMMY_SP, SyntaxContext::empty()),
    )),
    Expr::Ident(ident) if is_component_ident(ident) => Some(JSXElementName::Ident(ident.clone())),
    Expr::Member(member) => member_to_jsx(member).map(JSXElementName::JSXMemberExpr),
    _ => None,
  }
}

fn is_hoistable_test(test: &Expr) -> bool {
  match unwrap_expr(test) {
    Expr::Ident(_) => true,
    Expr::Unary(UnaryExpr {
      op: UnaryOp::Bang,
      arg,
      ..
    }) => matches!(unwrap_expr(arg), Expr::Ident(_)),
    Expr::Bin(BinExpr {
      op: BinaryOp::EqEqEq | BinaryOp::NotEqEq | BinaryOp::EqEq | BinaryOp::NotEq,
      left,
      right,
      ..
    }) => matches!(unwrap_expr(left), Expr::Ident(_)) && matches!(unwrap_expr(right), Expr::Lit(_)),
    _ => false,
  }
}

pub fn analyze_component(
  value: &Option<JSXAttrValue>,
  evaluator: &Evaluator<'_>,
  warnings: &mut WarningSink,
  line: usize,
) -> ComponentTarget {
  let expr = match value {
    Some(JSXAttrValue::Lit(Lit::Str(value))) => {
      return if is_intrinsic_tag(&value.value) {
        ComponentTarget::Tag(JSXElementName::Ident(Ident::new(
          value.value.clone(),
          DUMMY_SP,
          SyntaxContext::empty(),
        )))
      } else {
        ComponentTarget::Opaque
      };
    }
    _ => match attr_expr(value) {
      Some(expr) => unwrap_expr(expr),
      None => return ComponentTarget::Opaque,
    },
  };

  match expr {
    // Capitalised strings and lowercase identifiers are left alone without a warning.
    Expr::Lit(Lit::Str(_)) | Expr::Ident(_) => tag_name(expr)
      .map(ComponentTarget::Tag)
      .unwrap_or(ComponentTarget::Opaque),
    Expr::Tpl(_) => match evaluator.evaluate_constant(expr) {
      Some(Value::Str(tag)) if is_intrinsic_tag(&tag) => ComponentTarget::Tag(
        JSXElementName::Ident(Ident::new(tag.into(), DUMMY_SP, SyntaxContext::empty())),
      ),
      _ => ComponentTarget::Opaque,
    },
    Expr::Member(_) if tag_name(expr).is_some() => tag_name(expr)
      .map(ComponentTarget::Tag)
      .unwrap_or(ComponentTarget::Opaque),
    Expr::Cond(cond)
      if is_hoistable_test(&cond.test)
        && tag_name(&cond.cons).is_some()
        && tag_name(&cond.alt).is_some() =>
    {
      ComponentTarget::Hoist(Box::new(expr.clone()))
    }
    _ => {
      warnings.warn(
        "The `component` prop could not be resolved to a tag or component at build time",
        line,
      );
      ComponentTarget::Opaque
    }
  }
}

fn is_jsx_attr_name(name: &str) -> bool {
  name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$')
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-')
}

fn expr_attr(name: &str, value: JSXAttrValue) -> JSXAttrOrSpread {
  JSXAttrOrSpread::JSXAttr(JSXAttr {
    span: DUMMY_SP,
    name: JSXAttrName::Ident(IdentName::new(name.into(), DUMMY_SP)),
    value: Some(value),
  })
}

fn container(expr: Box<Expr>) -> JSXAttrValue {
  JSXAttrValue::JSXExprContainer(JSXExprContainer {
    span: DUMMY_SP,
    expr: JSXExpr::Expr(expr),
  })
}

/// Attributes that replace a `props` prop once the element is a plain element. `None` means
/// the prop has to stay as it is.
pub fn analyze_props(
  value: &Option<JSXAttrValue>,
  warnings: &mut WarningSink,
  line: usize,
) -> Option<Vec<JSXAttrOrSpread>> {
  let expr = match value {
    Some(JSXAttrValue::JSXExprContainer(_)) => attr_expr(value).map(unwrap_expr),
    _ => None,
  };
  let Some(expr) = expr else {
    warnings.warn("The `props` prop must be an object", line);
    return None;
  };

  let object = match expr {
    Expr::Object(object) => object,
    Expr::Lit(_) | Expr::Tpl(_) => {
      warnings.warn("The `props` prop must be an object", line);
      return None;
    }
    other => {
      return Some(vec![JSXAttrOrSpread::SpreadElement(SpreadElement {
        dot3_token: DUMMY_SP,
        expr: Box::new(other.clone()),
      })])
    }
  };

  let mut attrs = Vec::with_capacity(object.props.len());
  for prop in &object.props {
    let prop = match prop {
      PropOrSpread::Spread(spread) => {
        attrs.push(JSXAttrOrSpread::SpreadElement(SpreadElement {
          dot3_token: DUMMY_SP,
          expr: spread.expr.clone(),
        }));
        continue;
      }
      PropOrSpread::Prop(prop) => prop,
    };

    let (name, value) = match &**prop {
      Prop::KeyValue(kv) => {
        let name = match &kv.key {
          PropName::Ident(ident) => ident.sym.to_string(),
          PropName::Str(value) => value.value.to_string(),
          _ => return None,
        };
        let value = match unwrap_expr(&kv.value) {
          Expr::Lit(Lit::Str(value)) => JSXAttrValue::Lit(Lit::Str(Str::from(value.value.clone()))),
          _ => container(kv.value.clone()),
        };
        (name, value)
      }
      Prop::Shorthand(ident) => (
        ident.sym.to_string(),
        container(Box::new(Expr::Ident(ident.clone()))),
      ),
      _ => return None,
    };

    if matches!(name.as_str(), "className" | "class" | "style") {
      warnings.warn(
        format!("The `props` prop cannot contain `{name}`; pass it to the component directly"),
        line,
      );
      return None;
    }
    if !is_jsx_attr_name(&name) {
      return None;
    }
    attrs.push(expr_attr(&name, value));
  }
  Some(attrs)
}

/// Breakpoint aliases supplied on the element. `None` when they are not known at build time.
pub fn analyze_media_queries(
  value: &Option<JSXAttrValue>,
  evaluator: &Evaluator<'_>,
) -> Option<IndexMap<String, String>> {
  let Some(Value::Object(map)) = attr_expr(value).and_then(|expr| evaluator.evaluate_constant(expr))
  else {
    return None;
  };
  map
    .into_iter()
    .map(|(alias, query)| match query {
      Value::Str(query) => Some((alias, query)),
      _ => None,
    })
    .collect()
}
