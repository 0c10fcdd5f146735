use std::collections::{HashMap, HashSet};

use jsxstyle_swc_runner::RunContext;
use swc_core::common::sync::Lrc;
use swc_core::common::{BytePos, Mark, SourceMap, Span, Spanned};
use swc_core::ecma::ast::{
  ArrowExpr, AssignExpr, AssignOp, BinExpr, BinaryOp, BlockStmt, BlockStmtOrExpr, Class,
  CondExpr, DoWhileStmt, ForInStmt, ForOfStmt, ForStmt, Id, IfStmt, JSXElement, JSXElementName,
  LabeledStmt, Module, ModuleItem, Pat, Stmt, VarDecl, VarDeclKind, WhileStmt,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::bindings::{Binding, BindingTable};
use crate::cache::CacheState;
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::{ExtractOptions, LiteMode};
use crate::errors::ExtractWarning;
use crate::evaluator::Evaluator;
use crate::hoist::{DeclarationPositions, HoistFrame, UsedNames};
use crate::imports::{
  insert_component_import, insert_stylesheet_reference, prune_imports, scan_imports, ImportScan,
};
use crate::lite_mode::LiteBindings;
use crate::rewriter::{ElementRewriter, ElementSite, HoistSlot, RewriteOutcome};
use crate::stylesheet_name;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
struct VisitStats {
  elements: usize,
  static_elements: usize,
  partial_elements: usize,
}

/// Walks the module in document order, keeping the binding table and hoisting frames current,
/// and hands every style component element to the rewriter.
struct ExtractVisitor<'a> {
  rewriter: ElementRewriter<'a>,
  bindings: BindingTable,
  namespace: Value,
  unresolved_mark: Mark,
  extract_logical_or: bool,
  source_map: Lrc<SourceMap>,
  components: HashMap<Id, CatalogEntry>,
  lite: LiteBindings,
  positions: DeclarationPositions,
  names: UsedNames,
  /// One frame per statement list being walked. `None` where no statement can take a hoisted
  /// declaration, e.g. expression-bodied arrows and class bodies.
  frames: Vec<Option<HoistFrame>>,
  /// Component bindings some element stopped referring to.
  converted: HashSet<Id>,
  stats: VisitStats,
}

impl ExtractVisitor<'_> {
  fn lines(&self, span: Span) -> (usize, usize) {
    if span.is_dummy() {
      return (0, 0);
    }
    let start = self.source_map.lookup_char_pos(span.lo).line;
    let end = self
      .source_map
      .lookup_char_pos(BytePos(span.hi.0.saturating_sub(1)).max(span.lo))
      .line;
    (start, end)
  }

  fn process_element(&mut self, element: &mut JSXElement) {
    let JSXElementName::Ident(ident) = &element.opening.name else {
      return;
    };
    let component_id = ident.to_id();
    let (entry, lite_tag) = if let Some(entry) = self.components.get(&component_id) {
      (entry.clone(), None)
    } else if let Some(lite) = self.lite.get(&ident.sym) {
      (
        lite.entry.clone(),
        Some((ident.sym.to_string(), lite.local.clone())),
      )
    } else {
      return;
    };

    let (start_line, end_line) = self.lines(element.span);
    let evaluator = Evaluator {
      bindings: &self.bindings,
      namespace: &self.namespace,
      unresolved_mark: self.unresolved_mark,
      extract_logical_or: self.extract_logical_or,
    };
    let hoist = match self.frames.last_mut() {
      Some(Some(frame)) => Some(HoistSlot {
        frame,
        positions: &self.positions,
        names: &mut self.names,
      }),
      _ => None,
    };
    let site = ElementSite {
      entry: &entry,
      start_line,
      end_line,
      lite_local: lite_tag.as_ref().map(|(_, local)| local),
      hoist,
    };
    let outcome = self.rewriter.rewrite(element, site, &evaluator);

    self.stats.elements += 1;
    match outcome {
      RewriteOutcome::Static => {
        self.stats.static_elements += 1;
        if lite_tag.is_none() {
          self.converted.insert(component_id);
        }
      }
      RewriteOutcome::Partial => self.stats.partial_elements += 1,
      RewriteOutcome::Untouched => {}
    }
    if let Some((tag, _)) = &lite_tag {
      if outcome != RewriteOutcome::Static {
        self.lite.mark_renamed(tag);
      }
    }
  }

  fn with_frame<T: VisitMutWith<Self> + Spanned>(&mut self, node: &mut T) -> Vec<Stmt> {
    self.frames.push(Some(HoistFrame::new(node.span().lo)));
    node.visit_mut_with(self);
    match self.frames.pop() {
      Some(Some(frame)) => frame.pending,
      _ => Vec::new(),
    }
  }

  fn without_frame<T: VisitMutWith<Self>>(&mut self, node: &mut T) {
    self.frames.push(None);
    node.visit_mut_children_with(self);
    self.frames.pop();
  }

  /// Visit code that may run zero or many times per run of the enclosing statement. Nothing in
  /// it hoists past that statement; braced blocks inside still open their own frames.
  fn guarded<T: VisitMutWith<Self>>(&mut self, node: &mut T) {
    self.frames.push(None);
    node.visit_mut_with(self);
    self.frames.pop();
  }
}

impl VisitMut for ExtractVisitor<'_> {
  fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
    let mut out = Vec::with_capacity(items.len());
    for mut item in std::mem::take(items) {
      let hoisted = self.with_frame(&mut item);
      out.extend(hoisted.into_iter().map(ModuleItem::Stmt));
      out.push(item);
    }
    *items = out;
  }

  fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
    let mut out = Vec::with_capacity(stmts.len());
    for mut stmt in std::mem::take(stmts) {
      let hoisted = self.with_frame(&mut stmt);
      out.extend(hoisted);
      out.push(stmt);
    }
    *stmts = out;
  }

  fn visit_mut_block_stmt(&mut self, block: &mut BlockStmt) {
    self.bindings.push_scope();
    block.visit_mut_children_with(self);
    self.bindings.pop_scope();
  }

  fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
    if matches!(&*arrow.body, BlockStmtOrExpr::Expr(_)) {
      self.without_frame(arrow);
    } else {
      arrow.visit_mut_children_with(self);
    }
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    self.without_frame(class);
  }

  fn visit_mut_if_stmt(&mut self, stmt: &mut IfStmt) {
    stmt.test.visit_mut_with(self);
    self.guarded(&mut *stmt.cons);
    if let Some(alt) = &mut stmt.alt {
      self.guarded(&mut **alt);
    }
  }

  fn visit_mut_for_stmt(&mut self, stmt: &mut ForStmt) {
    stmt.init.visit_mut_with(self);
    self.frames.push(None);
    stmt.test.visit_mut_with(self);
    stmt.update.visit_mut_with(self);
    stmt.body.visit_mut_with(self);
    self.frames.pop();
  }

  fn visit_mut_for_in_stmt(&mut self, stmt: &mut ForInStmt) {
    stmt.left.visit_mut_with(self);
    stmt.right.visit_mut_with(self);
    self.guarded(&mut *stmt.body);
  }

  fn visit_mut_for_of_stmt(&mut self, stmt: &mut ForOfStmt) {
    stmt.left.visit_mut_with(self);
    stmt.right.visit_mut_with(self);
    self.guarded(&mut *stmt.body);
  }

  fn visit_mut_while_stmt(&mut self, stmt: &mut WhileStmt) {
    self.without_frame(stmt);
  }

  fn visit_mut_do_while_stmt(&mut self, stmt: &mut DoWhileStmt) {
    self.without_frame(stmt);
  }

  fn visit_mut_labeled_stmt(&mut self, stmt: &mut LabeledStmt) {
    self.guarded(&mut *stmt.body);
  }

  fn visit_mut_bin_expr(&mut self, expr: &mut BinExpr) {
    match expr.op {
      BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing => {
        expr.left.visit_mut_with(self);
        self.guarded(&mut *expr.right);
      }
      _ => expr.visit_mut_children_with(self),
    }
  }

  fn visit_mut_cond_expr(&mut self, expr: &mut CondExpr) {
    expr.test.visit_mut_with(self);
    self.guarded(&mut *expr.cons);
    self.guarded(&mut *expr.alt);
  }

  fn visit_mut_assign_expr(&mut self, expr: &mut AssignExpr) {
    match expr.op {
      AssignOp::AndAssign | AssignOp::OrAssign | AssignOp::NullishAssign => {
        expr.left.visit_mut_with(self);
        self.guarded(&mut *expr.right);
      }
      _ => expr.visit_mut_children_with(self),
    }
  }

  fn visit_mut_var_decl(&mut self, decl: &mut VarDecl) {
    decl.visit_mut_children_with(self);
    if decl.kind != VarDeclKind::Const {
      return;
    }
    for declarator in &decl.decls {
      let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) else {
        continue;
      };
      let value = Evaluator {
        bindings: &self.bindings,
        namespace: &self.namespace,
        unresolved_mark: self.unresolved_mark,
        extract_logical_or: self.extract_logical_or,
      }
      .evaluate_constant(init);
      if let Some(value) = value {
        self
          .bindings
          .declare(binding.id.to_id(), Binding::Constant(value));
      }
    }
  }

  fn visit_mut_jsx_element(&mut self, element: &mut JSXElement) {
    self.process_element(element);
    element.visit_mut_children_with(self);
  }
}

/// Result of transforming one module in place.
pub(crate) struct ModuleOutput {
  pub css: String,
  pub warnings: Vec<ExtractWarning>,
  /// Whether any element, import or declaration was changed.
  pub modified: bool,
}

/// Run the whole extraction over a parsed module: lite-mode pre-pass, import scan, element
/// rewriting, import pruning and the stylesheet reference.
pub(crate) fn transform_module(
  module: &mut Module,
  context: &RunContext,
  source_file: &str,
  cache: &mut CacheState,
  options: &ExtractOptions,
) -> ModuleOutput {
  let unresolved_mark = context.unresolved_mark;
  let catalog = Catalog::new(options);
  let mut names = UsedNames::from_module(module);
  let positions = DeclarationPositions::from_module(module);
  let lite = match options.lite_mode {
    LiteMode::Off => LiteBindings::default(),
    LiteMode::React | LiteMode::Preact => LiteBindings::scan(module, &catalog, &mut names),
  };
  let ImportScan {
    components,
    trusted,
    is_esm,
  } = scan_imports(module, &catalog, options, unresolved_mark);

  if components.is_empty() && lite.is_empty() {
    tracing::debug!("No style components in file");
    return ModuleOutput {
      css: String::new(),
      warnings: Vec::new(),
      modified: false,
    };
  }

  let mut bindings = BindingTable::new();
  for (id, binding) in trusted {
    bindings.declare(id, binding);
  }
  let namespace = Value::Object(
    options
      .static_namespace
      .iter()
      .map(|(key, value)| (key.clone(), Value::from(value)))
      .collect(),
  );

  let mut visitor = ExtractVisitor {
    rewriter: ElementRewriter::new(source_file, options, cache),
    bindings,
    namespace,
    unresolved_mark,
    extract_logical_or: options.extract_logical_or,
    source_map: context.source_map.clone(),
    components,
    lite,
    positions,
    names,
    frames: Vec::new(),
    converted: HashSet::new(),
    stats: VisitStats::default(),
  };
  module.visit_mut_with(&mut visitor);

  let ExtractVisitor {
    rewriter,
    lite,
    converted,
    stats,
    ..
  } = visitor;
  let (stylesheet, warnings) = rewriter.into_parts();
  tracing::debug!(
    elements = stats.elements,
    static_elements = stats.static_elements,
    partial_elements = stats.partial_elements,
    classes = stylesheet.class_count(),
    "Extracted styles"
  );

  prune_imports(module, &converted, unresolved_mark);
  let lite_imports = lite.imports();
  if let Some(source) = options.lite_mode.import_source() {
    insert_component_import(module, source, &lite_imports, is_esm, unresolved_mark);
  }

  let css = stylesheet.to_css();
  if !stylesheet.is_empty() {
    insert_stylesheet_reference(
      module,
      &stylesheet_name(source_file, &options.stylesheet_suffix),
      is_esm,
      unresolved_mark,
    );
  }

  ModuleOutput {
    css,
    warnings: warnings.into_warnings(),
    modified: stats.static_elements + stats.partial_elements > 0 || !lite_imports.is_empty(),
  }
}
