use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{
  BinExpr, BinaryOp, CondExpr, Expr, IdentName, JSXAttrValue, JSXExpr, JSXExprContainer, Lit,
  MemberExpr, MemberProp, Null, ParenExpr, Str, UnaryExpr, UnaryOp,
};

use crate::evaluator::unwrap_expr;

/// The class attribute already on the element.
#[derive(Debug, Clone)]
pub enum ExistingClass {
  Literal(String),
  Dynamic(Box<Expr>),
}

impl ExistingClass {
  pub fn into_expr(self) -> Box<Expr> {
    match self {
      ExistingClass::Literal(value) => str_expr(&value),
      ExistingClass::Dynamic(expr) => expr,
    }
  }
}

/// A runtime choice between two extracted classes. An empty branch has no class.
#[derive(Debug, Clone)]
pub struct ClassVariant {
  pub test: Box<Expr>,
  pub consequent: Option<String>,
  pub alternate: Option<String>,
}

fn str_expr(value: &str) -> Box<Expr> {
  Box::new(Expr::Lit(Lit::Str(Str::from(value))))
}

fn paren(expr: Box<Expr>) -> Box<Expr> {
  Box::new(Expr::Paren(ParenExpr {
    span: DUMMY_SP,
    expr,
  }))
}

fn bin(left: Box<Expr>, op: BinaryOp, right: Box<Expr>) -> Box<Expr> {
  Box::new(Expr::Bin(BinExpr {
    span: DUMMY_SP,
    op,
    left,
    right,
  }))
}

fn add(left: Box<Expr>, right: Box<Expr>) -> Box<Expr> {
  bin(left, BinaryOp::Add, right)
}

fn variant_expr(variant: &ClassVariant) -> Box<Expr> {
  paren(Box::new(Expr::Cond(CondExpr {
    span: DUMMY_SP,
    test: variant.test.clone(),
    cons: str_expr(variant.consequent.as_deref().unwrap_or("")),
    alt: str_expr(variant.alternate.as_deref().unwrap_or("")),
  })))
}

/// `(a ? "x" : "y") + (" " + (b ? "z" : ""))`
fn variants_expr(variants: &[ClassVariant]) -> Option<Box<Expr>> {
  let (first, rest) = variants.split_first()?;
  let mut expr = variant_expr(first);
  if rest.is_empty() {
    return Some(expr);
  }
  for variant in rest {
    expr = add(expr, paren(add(str_expr(" "), variant_expr(variant))));
  }
  Some(paren(expr))
}

enum Piece {
  Text(String),
  Expr(Box<Expr>),
}

/// Value of the class attribute combining what the element already had with the extracted
/// classes. `None` when there is nothing to put in it.
pub fn compose_class_value(
  existing: Option<ExistingClass>,
  statics: &[String],
  variants: &[ClassVariant],
) -> Option<JSXAttrValue> {
  let statics = statics.join(" ");
  let variants = variants_expr(variants);

  if variants.is_none() {
    let literal = match &existing {
      None => Some(statics.clone()),
      Some(ExistingClass::Literal(existing)) if statics.is_empty() => Some(existing.clone()),
      Some(ExistingClass::Literal(existing)) => Some(format!("{existing} {statics}")),
      Some(ExistingClass::Dynamic(_)) => None,
    };
    if let Some(literal) = literal {
      if literal.is_empty() && existing.is_none() {
        return None;
      }
      return Some(JSXAttrValue::Lit(Lit::Str(Str::from(literal))));
    }
  }

  let mut pieces = Vec::new();
  match existing {
    Some(ExistingClass::Literal(existing)) if !existing.is_empty() => {
      pieces.push(Piece::Text(existing))
    }
    Some(ExistingClass::Dynamic(expr)) => pieces.push(Piece::Expr(paren(bin(
      expr,
      BinaryOp::LogicalOr,
      str_expr(""),
    )))),
    _ => {}
  }
  if let Some(variants) = variants {
    pieces.push(Piece::Expr(variants));
  }
  if !statics.is_empty() {
    pieces.push(Piece::Text(statics));
  }

  let mut terms: Vec<Box<Expr>> = Vec::new();
  let mut pending = String::new();
  for (index, piece) in pieces.into_iter().enumerate() {
    if index > 0 {
      pending.push(' ');
    }
    match piece {
      Piece::Text(text) => pending.push_str(&text),
      Piece::Expr(expr) => {
        if !pending.is_empty() {
          terms.push(str_expr(&pending));
          pending.clear();
        }
        terms.push(expr);
      }
    }
  }
  if !pending.is_empty() {
    terms.push(str_expr(&pending));
  }

  let mut terms = terms.into_iter();
  let first = terms.next()?;
  let expr = match terms.next() {
    None => match *first {
      Expr::Paren(ParenExpr { expr, .. }) => expr,
      other => Box::new(other),
    },
    Some(second) => terms.fold(add(first, second), add),
  };

  Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
    span: DUMMY_SP,
    expr: JSXExpr::Expr(expr),
  }))
}

/// Spreads that may carry a class at runtime can only be read again when they are plain
/// identifiers or member expressions.
pub fn is_rereadable(expr: &Expr) -> bool {
  matches!(unwrap_expr(expr), Expr::Ident(_) | Expr::Member(_))
}

/// `typeof s === "object" && s !== null && s.className || <fallback>` for every spread, the
/// last spread first since it wins at runtime.
pub fn merge_spread_classes(
  spreads: &[Box<Expr>],
  class_attribute: &str,
  fallback: Option<Box<Expr>>,
) -> Option<Box<Expr>> {
  let mut chain: Option<Box<Expr>> = None;
  for spread in spreads.iter().rev() {
    let typeof_check = bin(
      Box::new(Expr::Unary(UnaryExpr {
        span: DUMMY_SP,
        op: UnaryOp::TypeOf,
        arg: spread.clone(),
      })),
      BinaryOp::EqEqEq,
      str_expr("object"),
    );
    let not_null = bin(
      spread.clone(),
      BinaryOp::NotEqEq,
      Box::new(Expr::Lit(Lit::Null(Null { span: DUMMY_SP }))),
    );
    let class_access = Box::new(Expr::Member(MemberExpr {
      span: DUMMY_SP,
      obj: spread.clone(),
      prop: MemberProp::Ident(IdentName::new(class_attribute.into(), DUMMY_SP)),
    }));
    let guarded = bin(
      bin(typeof_check, BinaryOp::LogicalAnd, not_null),
      BinaryOp::LogicalAnd,
      class_access,
    );
    chain = Some(match chain {
      None => guarded,
      Some(chain) => bin(chain, BinaryOp::LogicalOr, guarded),
    });
  }

  match (chain, fallback) {
    (Some(chain), Some(fallback)) => Some(bin(chain, BinaryOp::LogicalOr, fallback)),
    (chain, fallback) => chain.or(fallback),
  }
}
