use indexmap::{IndexMap, IndexSet};
use swc_core::ecma::ast::{Ident, JSXElementName, JSXOpeningElement, Module};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::catalog::{Catalog, CatalogEntry};
use crate::hoist::UsedNames;

/// A lowercase tag standing in for a style component, e.g. `<inline-block>`.
#[derive(Debug, Clone)]
pub struct LiteTag {
  pub entry: CatalogEntry,
  /// Local the tag is renamed to when the element keeps its runtime component.
  pub local: Ident,
}

/// Catalog bindings synthesized from tag names, before any import is scanned.
#[derive(Debug, Default)]
pub struct LiteBindings {
  tags: IndexMap<String, LiteTag>,
  renamed: IndexSet<String>,
}

struct CollectTags<'a> {
  catalog: &'a Catalog,
  found: IndexMap<String, CatalogEntry>,
}

impl Visit for CollectTags<'_> {
  fn visit_jsx_opening_element(&mut self, element: &JSXOpeningElement) {
    if let JSXElementName::Ident(ident) = &element.name {
      if !self.found.contains_key(&*ident.sym) {
        if let Some(entry) = self.catalog.for_lite_tag(&ident.sym) {
          self.found.insert(ident.sym.to_string(), entry.clone());
        }
      }
    }
    element.visit_children_with(self);
  }
}

impl LiteBindings {
  /// Find the tags of the module that map to catalog entries and reserve a local for each.
  pub fn scan(module: &Module, catalog: &Catalog, names: &mut UsedNames) -> Self {
    let mut collect = CollectTags {
      catalog,
      found: IndexMap::new(),
    };
    module.visit_with(&mut collect);

    let tags = collect
      .found
      .into_iter()
      .map(|(tag, entry)| {
        let local = names.fresh_ident(&entry.name);
        (tag, LiteTag { entry, local })
      })
      .collect();
    Self {
      tags,
      renamed: IndexSet::new(),
    }
  }

  pub fn get(&self, tag: &str) -> Option<&LiteTag> {
    self.tags.get(tag)
  }

  pub fn is_empty(&self) -> bool {
    self.tags.is_empty()
  }

  /// Note that an element with this tag now refers to the component local.
  pub fn mark_renamed(&mut self, tag: &str) {
    self.renamed.insert(tag.to_string());
  }

  /// `(exported name, local)` for every tag some element was renamed for, in first-seen order.
  pub fn imports(&self) -> Vec<(String, Ident)> {
    self
      .tags
      .iter()
      .filter(|(tag, _)| self.renamed.contains(*tag))
      .map(|(_, lite)| (lite.entry.name.clone(), lite.local.clone()))
      .collect()
  }
}
