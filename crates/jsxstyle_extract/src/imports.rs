use std::collections::{HashMap, HashSet};

use swc_core::common::{Mark, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
  BindingIdent, CallExpr, Callee, Decl, Expr, ExprOrSpread, ExprStmt, Id, Ident, IdentName,
  ImportDecl, ImportNamedSpecifier, ImportPhase, ImportSpecifier, KeyValuePatProp, Lit, Module,
  ModuleDecl, ModuleExportName, ModuleItem, ObjectPat, ObjectPatProp, Pat, PropName, Stmt, Str,
  VarDecl, VarDeclKind, VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::bindings::Binding;
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::ExtractOptions;
use crate::evaluator::unwrap_expr;

/// Bindings found in the module's import and top-level `require` statements.
#[derive(Debug, Default)]
pub struct ImportScan {
  /// Local binding to the style component it names.
  pub components: HashMap<Id, CatalogEntry>,
  /// Locals bound to members of whitelisted modules.
  pub trusted: Vec<(Id, Binding)>,
  /// Whether the module uses import/export syntax.
  pub is_esm: bool,
}

fn module_export_name(name: &ModuleExportName) -> String {
  match name {
    ModuleExportName::Ident(ident) => ident.sym.to_string(),
    ModuleExportName::Str(value) => value.value.to_string(),
  }
}

fn pat_prop_key(prop: &ObjectPatProp) -> Option<String> {
  match prop {
    ObjectPatProp::KeyValue(KeyValuePatProp { key, .. }) => match key {
      PropName::Ident(ident) => Some(ident.sym.to_string()),
      PropName::Str(value) => Some(value.value.to_string()),
      _ => None,
    },
    ObjectPatProp::Assign(assign) if assign.value.is_none() => Some(assign.key.sym.to_string()),
    _ => None,
  }
}

fn pat_prop_local(prop: &ObjectPatProp) -> Option<&Ident> {
  match prop {
    ObjectPatProp::KeyValue(KeyValuePatProp { value, .. }) => match &**value {
      Pat::Ident(binding) => Some(&binding.id),
      _ => None,
    },
    ObjectPatProp::Assign(assign) if assign.value.is_none() => Some(&assign.key.id),
    _ => None,
  }
}

/// Module id of `require("<id>")` when `require` is the free CommonJS function.
fn required_module(expr: &Expr, unresolved_mark: Mark) -> Option<String> {
  let Expr::Call(CallExpr {
    callee: Callee::Expr(callee),
    args,
    ..
  }) = unwrap_expr(expr)
  else {
    return None;
  };
  let Expr::Ident(callee) = &**callee else {
    return None;
  };
  if &*callee.sym != "require" || callee.ctxt.outer() != unresolved_mark || args.len() != 1 {
    return None;
  }
  match (&args[0].spread, &*args[0].expr) {
    (None, Expr::Lit(Lit::Str(value))) => Some(value.value.to_string()),
    _ => None,
  }
}

fn top_level_var_decls(module: &Module) -> impl Iterator<Item = &VarDecl> {
  module.body.iter().filter_map(|item| match item {
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(decl))) => Some(&**decl),
    _ => None,
  })
}

/// Find the style components and trusted members the module binds.
pub fn scan_imports(
  module: &Module,
  catalog: &Catalog,
  options: &ExtractOptions,
  unresolved_mark: Mark,
) -> ImportScan {
  let mut scan = ImportScan {
    is_esm: module
      .body
      .iter()
      .any(|item| matches!(item, ModuleItem::ModuleDecl(_))),
    ..Default::default()
  };

  for item in &module.body {
    let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
      continue;
    };
    if import.type_only {
      continue;
    }
    let source = import.src.value.to_string();

    if options.is_module_source(&source) {
      for specifier in &import.specifiers {
        let ImportSpecifier::Named(named) = specifier else {
          continue;
        };
        if named.is_type_only {
          continue;
        }
        let imported = named
          .imported
          .as_ref()
          .map(module_export_name)
          .unwrap_or_else(|| named.local.sym.to_string());
        if let Some(entry) = catalog.get(&imported) {
          scan.components.insert(named.local.to_id(), entry.clone());
        }
      }
    } else if options.is_whitelisted(&source) {
      for specifier in &import.specifiers {
        let (local, path) = match specifier {
          ImportSpecifier::Named(named) => (
            &named.local,
            vec![
              source.clone(),
              named
                .imported
                .as_ref()
                .map(module_export_name)
                .unwrap_or_else(|| named.local.sym.to_string()),
            ],
          ),
          ImportSpecifier::Default(default) => {
            (&default.local, vec![source.clone(), "default".to_string()])
          }
          ImportSpecifier::Namespace(namespace) => (&namespace.local, vec![source.clone()]),
        };
        scan.trusted.push((local.to_id(), Binding::Trusted(path)));
      }
    }
  }

  for decl in top_level_var_decls(module) {
    for declarator in &decl.decls {
      let Some(source) = declarator
        .init
        .as_deref()
        .and_then(|init| required_module(init, unresolved_mark))
      else {
        continue;
      };

      match &declarator.name {
        Pat::Object(ObjectPat { props, .. }) => {
          for prop in props {
            let (Some(key), Some(local)) = (pat_prop_key(prop), pat_prop_local(prop)) else {
              continue;
            };
            if options.is_module_source(&source) {
              if let Some(entry) = catalog.get(&key) {
                scan.components.insert(local.to_id(), entry.clone());
              }
            } else if options.is_whitelisted(&source) {
              scan
                .trusted
                .push((local.to_id(), Binding::Trusted(vec![source.clone(), key])));
            }
          }
        }
        Pat::Ident(binding) if options.is_whitelisted(&source) => {
          scan
            .trusted
            .push((binding.id.to_id(), Binding::Trusted(vec![source.clone()])));
        }
        _ => {}
      }
    }
  }

  scan
}

/// Identifiers read anywhere in the module. Declarations do not count as reads.
#[derive(Default)]
struct ReferencedIds {
  ids: HashSet<Id>,
}

impl Visit for ReferencedIds {
  fn visit_import_decl(&mut self, _import: &ImportDecl) {}

  fn visit_binding_ident(&mut self, _ident: &BindingIdent) {}

  fn visit_ident(&mut self, ident: &Ident) {
    self.ids.insert(ident.to_id());
  }
}

/// Drop the bindings in `candidates` that nothing reads any more, along with statements left
/// empty by that. Everything else about the import statements is kept as written.
pub fn prune_imports(module: &mut Module, candidates: &HashSet<Id>, unresolved_mark: Mark) {
  if candidates.is_empty() {
    return;
  }
  let mut referenced = ReferencedIds::default();
  module.visit_with(&mut referenced);
  let removable = |id: Id| candidates.contains(&id) && !referenced.ids.contains(&id);

  module.body.retain_mut(|item| match item {
    ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
      let before = import.specifiers.len();
      import.specifiers.retain(|specifier| {
        let local = match specifier {
          ImportSpecifier::Named(named) => &named.local,
          ImportSpecifier::Default(default) => &default.local,
          ImportSpecifier::Namespace(namespace) => &namespace.local,
        };
        !removable(local.to_id())
      });
      before == import.specifiers.len() || !import.specifiers.is_empty()
    }
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(decl))) => {
      let before = decl.decls.len();
      decl.decls.retain_mut(|declarator| {
        let is_require = declarator
          .init
          .as_deref()
          .and_then(|init| required_module(init, unresolved_mark))
          .is_some();
        let Pat::Object(object) = &mut declarator.name else {
          return true;
        };
        if !is_require {
          return true;
        }
        let props_before = object.props.len();
        object.props.retain(|prop| match pat_prop_local(prop) {
          Some(local) => !removable(local.to_id()),
          None => true,
        });
        props_before == object.props.len() || !object.props.is_empty()
      });
      before == decl.decls.len() || !decl.decls.is_empty()
    }
    _ => true,
  });
}

fn is_directive(item: &ModuleItem) -> bool {
  matches!(
    item,
    ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) if matches!(&**expr, Expr::Lit(Lit::Str(_)))
  )
}

fn insert_after_directives(module: &mut Module, items: Vec<ModuleItem>) {
  let index = module.body.iter().take_while(|item| is_directive(item)).count();
  module.body.splice(index..index, items);
}

fn require_call(source: &str, unresolved_mark: Mark) -> Box<Expr> {
  Box::new(Expr::Call(CallExpr {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    callee: Callee::Expr(Box::new(Expr::Ident(Ident::new(
      "require".into(),
      DUMMY_SP,
      SyntaxContext::empty().apply_mark(unresolved_mark),
    )))),
    args: vec![ExprOrSpread {
      spread: None,
      expr: Box::new(Expr::Lit(Lit::Str(Str::from(source)))),
    }],
    type_args: None,
  }))
}

/// Reference the generated stylesheet as the first statement of the module.
pub fn insert_stylesheet_reference(
  module: &mut Module,
  stylesheet: &str,
  is_esm: bool,
  unresolved_mark: Mark,
) {
  let item = if is_esm {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
      span: DUMMY_SP,
      specifiers: Vec::new(),
      src: Box::new(Str::from(stylesheet)),
      type_only: false,
      with: None,
      phase: ImportPhase::Evaluation,
    }))
  } else {
    ModuleItem::Stmt(Stmt::Expr(ExprStmt {
      span: DUMMY_SP,
      expr: require_call(stylesheet, unresolved_mark),
    }))
  };
  insert_after_directives(module, vec![item]);
}

/// Import the components that lite-mode tags were renamed to. `components` pairs each exported
/// name with its local identifier.
pub fn insert_component_import(
  module: &mut Module,
  source: &str,
  components: &[(String, Ident)],
  is_esm: bool,
  unresolved_mark: Mark,
) {
  if components.is_empty() {
    return;
  }

  let item = if is_esm {
    let specifiers = components
      .iter()
      .map(|(name, local)| {
        ImportSpecifier::Named(ImportNamedSpecifier {
          span: DUMMY_SP,
          local: local.clone(),
          imported: (&*local.sym != name.as_str()).then(|| {
            ModuleExportName::Ident(Ident::new(
              name.as_str().into(),
              DUMMY_SP,
              SyntaxContext::empty(),
            ))
          }),
          is_type_only: false,
        })
      })
      .collect();
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
      span: DUMMY_SP,
      specifiers,
      src: Box::new(Str::from(source)),
      type_only: false,
      with: None,
      phase: ImportPhase::Evaluation,
    }))
  } else {
    let props = components
      .iter()
      .map(|(name, local)| {
        ObjectPatProp::KeyValue(KeyValuePatProp {
          key: PropName::Ident(IdentName::new(name.as_str().into(), DUMMY_SP)),
          value: Box::new(Pat::Ident(local.clone().into())),
        })
      })
      .collect();
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
      span: DUMMY_SP,
      ctxt: SyntaxContext::empty(),
      kind: VarDeclKind::Const,
      declare: false,
      decls: vec![VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Object(ObjectPat {
          span: DUMMY_SP,
          props,
          optional: false,
          type_ann: None,
        }),
        init: Some(require_call(source, unresolved_mark)),
        definite: false,
      }],
    }))))
  };
  insert_after_directives(module, vec![item]);
}

#[cfg(test)]
mod tests {
  use indoc::indoc;
  use jsxstyle_swc_runner::test_utils::{run_test_visit, RunTestContext};
  use swc_core::ecma::visit::VisitMut;

  use super::*;
  use pretty_assertions::assert_eq;

  struct Scan {
    context: RunTestContext,
    options: ExtractOptions,
    components: Vec<String>,
    trusted: Vec<Vec<String>>,
    is_esm: bool,
  }

  impl VisitMut for Scan {
    fn visit_mut_module(&mut self, module: &mut Module) {
      let catalog = Catalog::new(&self.options);
      let scan = scan_imports(module, &catalog, &self.options, self.context.unresolved_mark);
      let mut components: Vec<String> = scan
        .components
        .iter()
        .map(|(id, entry)| format!("{}={}", id.0, entry.name))
        .collect();
      components.sort();
      self.components = components;
      self.trusted = scan
        .trusted
        .into_iter()
        .filter_map(|(_, binding)| match binding {
          Binding::Trusted(path) => Some(path),
          _ => None,
        })
        .collect();
      self.is_esm = scan.is_esm;
    }
  }

  fn scan(code: &str) -> Scan {
    let options = ExtractOptions {
      whitelisted_modules: vec!["./constants".into()],
      ..Default::default()
    };
    run_test_visit(code, |context| Scan {
      context,
      options,
      components: Vec::new(),
      trusted: Vec::new(),
      is_esm: false,
    })
    .visitor
  }

  #[test]
  fn finds_components_in_imports_and_requires() {
    let result = scan(indoc! {r#"
      import { Block, Row as R, useMatchMedia } from "jsxstyle";
      import { Col } from "not-jsxstyle";
      const { InlineBlock, Col: C } = require("jsxstyle/preact");
    "#});
    assert_eq!(
      result.components,
      vec!["Block=Block", "C=Col", "InlineBlock=InlineBlock", "R=Row"]
    );
    assert!(result.is_esm);
  }

  #[test]
  fn whitelisted_modules_are_trusted() {
    let result = scan(indoc! {r#"
      const { spacing } = require("./constants");
      const constants = require("./constants");
    "#});
    assert_eq!(
      result.trusted,
      vec![
        vec!["./constants".to_string(), "spacing".to_string()],
        vec!["./constants".to_string()],
      ]
    );
    assert!(!result.is_esm);
  }

  #[test]
  fn shadowed_require_is_ignored() {
    let result = scan(indoc! {r#"
      const require = () => ({});
      const { Block } = require("jsxstyle");
    "#});
    assert!(result.components.is_empty());
  }

  struct Prune {
    context: RunTestContext,
    options: ExtractOptions,
  }

  impl VisitMut for Prune {
    fn visit_mut_module(&mut self, module: &mut Module) {
      let catalog = Catalog::new(&self.options);
      let unresolved_mark = self.context.unresolved_mark;
      let scan = scan_imports(module, &catalog, &self.options, unresolved_mark);
      let candidates = scan.components.keys().cloned().collect();
      prune_imports(module, &candidates, unresolved_mark);
      insert_stylesheet_reference(module, "test/file.jsxstyle.css", scan.is_esm, unresolved_mark);
    }
  }

  fn prune(code: &str) -> String {
    run_test_visit(code, |context| Prune {
      context,
      options: ExtractOptions::default(),
    })
    .output_code
  }

  #[test]
  fn prunes_unused_component_bindings() {
    let output = prune(indoc! {r#"
      "use client";
      import { Block, Row, useMatchMedia } from "jsxstyle";
      import { Col } from "jsxstyle/preact";
      <Row />;
    "#});
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], r#""use client";"#);
    assert_eq!(lines[1], r#"import "test/file.jsxstyle.css";"#);
    assert_eq!(lines[2], r#"import { Row, useMatchMedia } from "jsxstyle";"#);
    assert!(!output.contains("jsxstyle/preact"), "{output}");
  }

  #[test]
  fn prunes_require_patterns() {
    let output = prune(indoc! {r#"
      const { Block } = require("jsxstyle");
      const { Row, cache } = require("jsxstyle");
    "#});
    assert_eq!(
      output,
      indoc! {r#"
        require("test/file.jsxstyle.css");
        const { cache } = require("jsxstyle");
      "#}
    );
  }

  struct AddImport {
    context: RunTestContext,
    is_esm: bool,
  }

  impl VisitMut for AddImport {
    fn visit_mut_module(&mut self, module: &mut Module) {
      let local = Ident::new("_Block".into(), DUMMY_SP, SyntaxContext::empty());
      let row = Ident::new("Row".into(), DUMMY_SP, SyntaxContext::empty());
      insert_component_import(
        module,
        "jsxstyle",
        &[("Block".to_string(), local), ("Row".to_string(), row)],
        self.is_esm,
        self.context.unresolved_mark,
      );
    }
  }

  #[test]
  fn synthesized_component_imports() {
    let esm = run_test_visit("export {};", |context| AddImport {
      context,
      is_esm: true,
    });
    assert!(
      esm
        .output_code
        .starts_with(r#"import { Block as _Block, Row } from "jsxstyle";"#),
      "{}",
      esm.output_code
    );

    let cjs = run_test_visit("f();", |context| AddImport {
      context,
      is_esm: false,
    });
    assert!(
      cjs
        .output_code
        .starts_with(r#"const { Block: _Block, Row: Row } = require("jsxstyle");"#),
      "{}",
      cjs.output_code
    );
  }
}
