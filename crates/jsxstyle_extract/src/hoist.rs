use std::collections::{HashMap, HashSet};

use swc_core::common::{BytePos, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
  BindingIdent, ClassDecl, Expr, FnDecl, Id, Ident, ImportDefaultSpecifier, ImportNamedSpecifier,
  ImportStarAsSpecifier, Module, Stmt, VarDecl, VarDeclKind, VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Every identifier name used anywhere in the module, so synthesized bindings never shadow or
/// collide with user code.
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
  used: HashSet<String>,
}

impl UsedNames {
  pub fn from_module(module: &Module) -> Self {
    let mut names = UsedNames::default();
    module.visit_with(&mut names);
    names
  }

  /// `base`, then `_base`, `_base2`, `_base3`, ...
  pub fn fresh_ident(&mut self, base: &str) -> Ident {
    if self.used.insert(base.to_string()) {
      return Ident::new(base.into(), DUMMY_SP, SyntaxContext::empty());
    }
    let mut index = 0usize;
    loop {
      let candidate = if index == 0 {
        format!("_{base}")
      } else {
        format!("_{base}{}", index + 1)
      };
      if self.used.insert(candidate.clone()) {
        return Ident::new(candidate.into(), DUMMY_SP, SyntaxContext::empty());
      }
      index += 1;
    }
  }
}

impl Visit for UsedNames {
  fn visit_ident(&mut self, ident: &Ident) {
    self.used.insert(ident.sym.to_string());
  }
}

/// Where every binding of the module is declared.
#[derive(Debug, Default)]
pub struct DeclarationPositions {
  positions: HashMap<Id, BytePos>,
}

impl DeclarationPositions {
  pub fn from_module(module: &Module) -> Self {
    let mut positions = DeclarationPositions::default();
    module.visit_with(&mut positions);
    positions
  }

  fn record(&mut self, ident: &Ident) {
    self.positions.entry(ident.to_id()).or_insert(ident.span.lo);
  }

  /// Whether every identifier `expr` reads is either free or declared before `position`.
  pub fn all_declared_before(&self, expr: &Expr, position: BytePos) -> bool {
    let mut reads = IdentReads::default();
    expr.visit_with(&mut reads);
    reads.ids.iter().all(|id| match self.positions.get(id) {
      Some(declared) => *declared < position,
      None => true,
    })
  }
}

impl Visit for DeclarationPositions {
  fn visit_binding_ident(&mut self, ident: &BindingIdent) {
    self.record(&ident.id);
  }

  fn visit_fn_decl(&mut self, decl: &FnDecl) {
    self.record(&decl.ident);
    decl.visit_children_with(self);
  }

  fn visit_class_decl(&mut self, decl: &ClassDecl) {
    self.record(&decl.ident);
    decl.visit_children_with(self);
  }

  fn visit_import_named_specifier(&mut self, specifier: &ImportNamedSpecifier) {
    self.record(&specifier.local);
  }

  fn visit_import_default_specifier(&mut self, specifier: &ImportDefaultSpecifier) {
    self.record(&specifier.local);
  }

  fn visit_import_star_as_specifier(&mut self, specifier: &ImportStarAsSpecifier) {
    self.record(&specifier.local);
  }
}

#[derive(Default)]
struct IdentReads {
  ids: Vec<Id>,
}

impl Visit for IdentReads {
  fn visit_ident(&mut self, ident: &Ident) {
    self.ids.push(ident.to_id());
  }
}

/// The statement currently being walked, and the declarations to insert in front of it.
#[derive(Debug)]
pub struct HoistFrame {
  pub statement_start: BytePos,
  pub pending: Vec<Stmt>,
}

impl HoistFrame {
  pub fn new(statement_start: BytePos) -> Self {
    Self {
      statement_start,
      pending: Vec::new(),
    }
  }
}

/// `const <name> = <init>;`
pub fn const_declaration(name: Ident, init: Box<Expr>) -> Stmt {
  Stmt::Decl(
    VarDecl {
      span: DUMMY_SP,
      ctxt: SyntaxContext::empty(),
      kind: VarDeclKind::Const,
      declare: false,
      decls: vec![VarDeclarator {
        span: DUMMY_SP,
        name: name.into(),
        init: Some(init),
        definite: false,
      }],
    }
    .into(),
  )
}
