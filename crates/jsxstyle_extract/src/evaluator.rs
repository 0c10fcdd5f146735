use indexmap::IndexMap;
use swc_core::common::{EqIgnoreSpan, Mark};
use swc_core::ecma::ast::{
  BinExpr, BinaryOp, Expr, Ident, Lit, MemberExpr, MemberProp, ObjectLit, Prop, PropName,
  PropOrSpread, Tpl, UnaryExpr, UnaryOp,
};

use crate::bindings::{Binding, BindingTable};
use crate::value::{format_number, Value};

/// A value selected at runtime by `test`. Both branches are constant scalars; `Null` means the
/// branch contributes nothing.
#[derive(Debug, Clone)]
pub struct ConditionalValue {
  pub test: Box<Expr>,
  pub consequent: Value,
  pub alternate: Value,
}

impl ConditionalValue {
  /// Whether both values branch on the same test. Tests that may have side effects never
  /// match, since merging them would evaluate the test fewer times than written.
  pub fn same_condition(&self, other: &ConditionalValue) -> bool {
    is_pure_condition(&self.test)
      && is_pure_condition(&other.test)
      && self.test.eq_ignore_span(&other.test)
  }
}

/// Identifiers, literals and member chains over them, optionally negated or compared.
fn is_pure_condition(expr: &Expr) -> bool {
  match unwrap_expr(expr) {
    Expr::Ident(_) | Expr::Lit(_) => true,
    Expr::Member(MemberExpr { obj, prop, .. }) => {
      let pure_prop = match prop {
        MemberProp::Ident(_) | MemberProp::PrivateName(_) => true,
        MemberProp::Computed(computed) => matches!(unwrap_expr(&computed.expr), Expr::Lit(_)),
      };
      pure_prop && is_pure_condition(obj)
    }
    Expr::Unary(UnaryExpr {
      op: UnaryOp::Bang,
      arg,
      ..
    }) => is_pure_condition(arg),
    Expr::Bin(BinExpr {
      op:
        BinaryOp::EqEqEq
        | BinaryOp::NotEqEq
        | BinaryOp::EqEq
        | BinaryOp::NotEq
        | BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr,
      left,
      right,
      ..
    }) => is_pure_condition(left) && is_pure_condition(right),
    _ => false,
  }
}

#[derive(Debug, Clone)]
pub enum Evaluation {
  Constant(Value),
  Conditional(ConditionalValue),
  Opaque,
}

impl Evaluation {
  pub fn is_opaque(&self) -> bool {
    matches!(self, Evaluation::Opaque)
  }
}

/// Constant folding over expressions, relative to a snapshot of the binding table.
///
/// Identifiers that the resolver could not bind (free variables) are looked up in the static
/// namespace. Members of whitelisted modules are looked up in the namespace under their module
/// id.
pub struct Evaluator<'a> {
  pub bindings: &'a BindingTable,
  pub namespace: &'a Value,
  pub unresolved_mark: Mark,
  pub extract_logical_or: bool,
}

impl<'a> Evaluator<'a> {
  /// Classify an attribute value.
  pub fn evaluate(&self, expr: &Expr) -> Evaluation {
    if let Some(value) = self.evaluate_constant(expr) {
      return Evaluation::Constant(value);
    }

    let expr = unwrap_expr(expr);
    let (test, consequent, alternate) = match expr {
      Expr::Cond(cond) => (
        cond.test.clone(),
        self.evaluate_constant(&cond.cons),
        self.evaluate_constant(&cond.alt),
      ),
      Expr::Bin(BinExpr {
        op: BinaryOp::LogicalAnd,
        left,
        right,
        ..
      }) => (left.clone(), self.evaluate_constant(right), Some(Value::Null)),
      Expr::Bin(BinExpr {
        op: BinaryOp::LogicalOr,
        left,
        right,
        ..
      }) if self.extract_logical_or => {
        (left.clone(), Some(Value::Null), self.evaluate_constant(right))
      }
      _ => return Evaluation::Opaque,
    };

    match (consequent, alternate) {
      (Some(consequent), Some(alternate)) if consequent.is_scalar() && alternate.is_scalar() => {
        let (test, swapped) = normalize_condition(test);
        let (consequent, alternate) = if swapped {
          (alternate, consequent)
        } else {
          (consequent, alternate)
        };
        Evaluation::Conditional(ConditionalValue {
          test,
          consequent,
          alternate,
        })
      }
      _ => Evaluation::Opaque,
    }
  }

  /// Fold `expr` to a constant, or `None` when any part of it is only known at runtime.
  pub fn evaluate_constant(&self, expr: &Expr) -> Option<Value> {
    match unwrap_expr(expr) {
      Expr::Lit(lit) => match lit {
        Lit::Str(value) => Some(Value::Str(value.value.to_string())),
        Lit::Num(value) => Some(Value::Num(value.value)),
        Lit::Bool(value) => Some(Value::Bool(value.value)),
        Lit::Null(_) => Some(Value::Null),
        _ => None,
      },
      Expr::Tpl(tpl) => self.evaluate_tpl(tpl),
      Expr::Ident(ident) => self.evaluate_ident(ident),
      Expr::Unary(unary) => self.evaluate_unary(unary),
      Expr::Bin(bin) => self.evaluate_bin(bin),
      Expr::Cond(cond) => {
        let test = self.evaluate_constant(&cond.test)?;
        if test.is_truthy() {
          self.evaluate_constant(&cond.cons)
        } else {
          self.evaluate_constant(&cond.alt)
        }
      }
      Expr::Member(member) => self.evaluate_member(member),
      Expr::Object(object) => self.evaluate_object(object).map(Value::Object),
      Expr::Array(array) => {
        let mut items = Vec::with_capacity(array.elems.len());
        for elem in &array.elems {
          let elem = elem.as_ref()?;
          let value = self.evaluate_constant(&elem.expr)?;
          match (elem.spread.is_some(), value) {
            (true, Value::Array(inner)) => items.extend(inner),
            (true, _) => return None,
            (false, value) => items.push(value),
          }
        }
        Some(Value::Array(items))
      }
      _ => None,
    }
  }

  pub fn is_unresolved(&self, ident: &Ident) -> bool {
    ident.ctxt.outer() == self.unresolved_mark
  }

  fn evaluate_ident(&self, ident: &Ident) -> Option<Value> {
    match self.bindings.lookup(&ident.to_id()) {
      Some(Binding::Constant(value)) => return Some(value.clone()),
      Some(Binding::Trusted(path)) => return self.resolve_trusted(path),
      Some(Binding::Opaque) => return None,
      None => {}
    }

    if !self.is_unresolved(ident) {
      return None;
    }
    if &*ident.sym == "undefined" {
      return Some(Value::Null);
    }
    self.namespace.get(&ident.sym).cloned()
  }

  fn resolve_trusted(&self, path: &[String]) -> Option<Value> {
    let mut current = self.namespace;
    for segment in path {
      current = current.get(segment)?;
    }
    Some(current.clone())
  }

  fn evaluate_member(&self, member: &MemberExpr) -> Option<Value> {
    let object = self.evaluate_constant(&member.obj)?;
    let key = match &member.prop {
      MemberProp::Ident(name) => name.sym.to_string(),
      MemberProp::Computed(computed) => self.evaluate_constant(&computed.expr)?.to_js_string()?,
      MemberProp::PrivateName(_) => return None,
    };
    match (&object, key.as_str()) {
      (Value::Str(value), "length") => Some(Value::Num(value.encode_utf16().count() as f64)),
      (Value::Array(items), "length") => Some(Value::Num(items.len() as f64)),
      _ => object.get(&key).cloned(),
    }
  }

  fn evaluate_object(&self, object: &ObjectLit) -> Option<IndexMap<String, Value>> {
    let mut map = IndexMap::new();
    for prop in &object.props {
      match prop {
        PropOrSpread::Spread(spread) => match self.evaluate_constant(&spread.expr)? {
          Value::Object(inner) => map.extend(inner),
          Value::Null => {}
          _ => return None,
        },
        PropOrSpread::Prop(prop) => match &**prop {
          Prop::KeyValue(kv) => {
            let key = self.prop_name(&kv.key)?;
            let value = self.evaluate_constant(&kv.value)?;
            map.insert(key, value);
          }
          Prop::Shorthand(ident) => {
            let value = self.evaluate_ident(ident)?;
            map.insert(ident.sym.to_string(), value);
          }
          _ => return None,
        },
      }
    }
    Some(map)
  }

  pub fn prop_name(&self, name: &PropName) -> Option<String> {
    match name {
      PropName::Ident(ident) => Some(ident.sym.to_string()),
      PropName::Str(value) => Some(value.value.to_string()),
      PropName::Num(value) => Some(format_number(value.value)),
      PropName::Computed(computed) => self.evaluate_constant(&computed.expr)?.to_js_string(),
      PropName::BigInt(_) => None,
    }
  }

  fn evaluate_tpl(&self, tpl: &Tpl) -> Option<Value> {
    let mut out = String::new();
    for (index, quasi) in tpl.quasis.iter().enumerate() {
      out.push_str(quasi.cooked.as_ref()?);
      if let Some(expr) = tpl.exprs.get(index) {
        out.push_str(&self.evaluate_constant(expr)?.to_js_string()?);
      }
    }
    Some(Value::Str(out))
  }

  fn evaluate_unary(&self, unary: &UnaryExpr) -> Option<Value> {
    let arg = self.evaluate_constant(&unary.arg)?;
    match unary.op {
      UnaryOp::Minus => to_number(&arg).map(|value| Value::Num(-value)),
      UnaryOp::Plus => to_number(&arg).map(Value::Num),
      UnaryOp::Bang => Some(Value::Bool(!arg.is_truthy())),
      UnaryOp::Void => Some(Value::Null),
      UnaryOp::TypeOf => Some(Value::Str(
        match arg {
          Value::Str(_) => "string",
          Value::Num(_) => "number",
          Value::Bool(_) => "boolean",
          Value::Null | Value::Object(_) | Value::Array(_) => "object",
        }
        .to_string(),
      )),
      _ => None,
    }
  }

  fn evaluate_bin(&self, bin: &BinExpr) -> Option<Value> {
    match bin.op {
      BinaryOp::LogicalAnd => {
        let left = self.evaluate_constant(&bin.left)?;
        if left.is_truthy() {
          self.evaluate_constant(&bin.right)
        } else {
          Some(left)
        }
      }
      BinaryOp::LogicalOr => {
        let left = self.evaluate_constant(&bin.left)?;
        if left.is_truthy() {
          Some(left)
        } else {
          self.evaluate_constant(&bin.right)
        }
      }
      BinaryOp::NullishCoalescing => {
        let left = self.evaluate_constant(&bin.left)?;
        if left.is_null() {
          self.evaluate_constant(&bin.right)
        } else {
          Some(left)
        }
      }
      op => {
        let left = self.evaluate_constant(&bin.left)?;
        let right = self.evaluate_constant(&bin.right)?;
        fold_binary(op, &left, &right)
      }
    }
  }
}

fn fold_binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
  match op {
    BinaryOp::Add => match (left, right) {
      (Value::Str(_), _) | (_, Value::Str(_)) => Some(Value::Str(format!(
        "{}{}",
        left.to_js_string()?,
        right.to_js_string()?
      ))),
      _ => Some(Value::Num(to_number(left)? + to_number(right)?)),
    },
    BinaryOp::Sub => Some(Value::Num(to_number(left)? - to_number(right)?)),
    BinaryOp::Mul => Some(Value::Num(to_number(left)? * to_number(right)?)),
    BinaryOp::Div => Some(Value::Num(to_number(left)? / to_number(right)?)),
    BinaryOp::Mod => Some(Value::Num(to_number(left)? % to_number(right)?)),
    BinaryOp::EqEqEq => left.strict_eq(right).map(Value::Bool),
    BinaryOp::NotEqEq => left.strict_eq(right).map(|eq| Value::Bool(!eq)),
    BinaryOp::EqEq if same_type(left, right) => left.strict_eq(right).map(Value::Bool),
    BinaryOp::NotEq if same_type(left, right) => left.strict_eq(right).map(|eq| Value::Bool(!eq)),
    BinaryOp::Lt => Some(Value::Bool(to_number(left)? < to_number(right)?)),
    BinaryOp::LtEq => Some(Value::Bool(to_number(left)? <= to_number(right)?)),
    BinaryOp::Gt => Some(Value::Bool(to_number(left)? > to_number(right)?)),
    BinaryOp::GtEq => Some(Value::Bool(to_number(left)? >= to_number(right)?)),
    _ => None,
  }
}

fn same_type(left: &Value, right: &Value) -> bool {
  std::mem::discriminant(left) == std::mem::discriminant(right)
}

fn to_number(value: &Value) -> Option<f64> {
  match value {
    Value::Num(value) => Some(*value),
    Value::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
    Value::Null => Some(0.0),
    Value::Str(value) if value.trim().is_empty() => Some(0.0),
    Value::Str(value) => value.trim().parse::<f64>().ok(),
    Value::Object(_) | Value::Array(_) => None,
  }
}

/// Strip parentheses and TypeScript-only wrappers.
pub fn unwrap_expr(expr: &Expr) -> &Expr {
  match expr {
    Expr::Paren(paren) => unwrap_expr(&paren.expr),
    Expr::TsAs(inner) => unwrap_expr(&inner.expr),
    Expr::TsSatisfies(inner) => unwrap_expr(&inner.expr),
    Expr::TsNonNull(inner) => unwrap_expr(&inner.expr),
    Expr::TsConstAssertion(inner) => unwrap_expr(&inner.expr),
    Expr::TsTypeAssertion(inner) => unwrap_expr(&inner.expr),
    _ => expr,
  }
}

/// Rewrite a condition so that the truthy branch matches the condition as written without
/// negation. Returns whether the branches must be swapped.
///
/// `!x` becomes `x`, `a !== b` becomes `a === b` and `a != b` becomes `a == b`, each
/// swapping the branches.
pub fn normalize_condition(test: Box<Expr>) -> (Box<Expr>, bool) {
  let mut test = test;
  let mut swapped = false;
  loop {
    let next = match *test {
      Expr::Paren(paren) => paren.expr,
      Expr::Unary(UnaryExpr {
        op: UnaryOp::Bang,
        arg,
        ..
      }) => {
        swapped = !swapped;
        arg
      }
      Expr::Bin(BinExpr {
        span,
        op: op @ (BinaryOp::NotEqEq | BinaryOp::NotEq),
        left,
        right,
      }) => {
        swapped = !swapped;
        let op = if op == BinaryOp::NotEqEq {
          BinaryOp::EqEqEq
        } else {
          BinaryOp::EqEq
        };
        return (Box::new(Expr::Bin(BinExpr { span, op, left, right })), swapped);
      }
      other => return (Box::new(other), swapped),
    };
    test = next;
  }
}
