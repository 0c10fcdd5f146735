use std::collections::HashMap;

use swc_core::ecma::ast::Id;

use crate::value::Value;

/// What is known about a local identifier at a given point of the walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
  Constant(Value),
  /// A member of a whitelisted module. The path starts with the module id, followed by the
  /// imported name (none for namespace imports).
  Trusted(Vec<String>),
  Opaque,
}

/// Lexical scope stack keyed by resolved identifier.
///
/// The resolver already gives every binding a unique syntax context, so shadowing never
/// causes two different bindings to share a key. The stack only controls visibility: entries
/// declared inside a block disappear once the block is closed.
#[derive(Debug, Default)]
pub struct BindingTable {
  scopes: Vec<HashMap<Id, Binding>>,
}

impl BindingTable {
  pub fn new() -> Self {
    Self {
      scopes: vec![HashMap::new()],
    }
  }

  pub fn push_scope(&mut self) {
    self.scopes.push(HashMap::new());
  }

  pub fn pop_scope(&mut self) {
    if self.scopes.len() > 1 {
      self.scopes.pop();
    }
  }

  pub fn declare(&mut self, id: Id, binding: Binding) {
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(id, binding);
    }
  }

  pub fn lookup(&self, id: &Id) -> Option<&Binding> {
    self.scopes.iter().rev().find_map(|scope| scope.get(id))
  }
}

#[cfg(test)]
mod tests {
  use swc_core::atoms::Atom;
  use swc_core::common::SyntaxContext;

  use super::*;
  use pretty_assertions::assert_eq;

  fn id(name: &str) -> Id {
    (Atom::from(name), SyntaxContext::empty())
  }

  #[test]
  fn inner_scopes_shadow_and_close() {
    let mut table = BindingTable::new();
    table.declare(id("a"), Binding::Constant(Value::Num(1.0)));

    table.push_scope();
    table.declare(id("a"), Binding::Opaque);
    assert_eq!(table.lookup(&id("a")), Some(&Binding::Opaque));
    table.pop_scope();

    assert_eq!(
      table.lookup(&id("a")),
      Some(&Binding::Constant(Value::Num(1.0)))
    );
  }

  #[test]
  fn the_module_scope_is_never_popped() {
    let mut table = BindingTable::new();
    table.pop_scope();
    table.declare(id("b"), Binding::Opaque);
    table.push_scope();
    table.pop_scope();
    table.pop_scope();
    assert_eq!(table.lookup(&id("b")), Some(&Binding::Opaque));
  }
}
