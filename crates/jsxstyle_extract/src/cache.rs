use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ClassNameFn;
use crate::hash::{string_hash, to_base36};

/// How new class names are derived from a cache key.
#[derive(Clone)]
pub enum ClassNaming {
  /// Prefix followed by the base-36 counter, e.g. `_x0`, `_x1`.
  Counter { prefix: String },
  /// `_` followed by the base-36 string hash of the key.
  Hash,
  Custom(ClassNameFn),
}

impl fmt::Debug for ClassNaming {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ClassNaming::Counter { prefix } => f.debug_struct("Counter").field("prefix", prefix).finish(),
      ClassNaming::Hash => f.write_str("Hash"),
      ClassNaming::Custom(_) => f.write_str("Custom"),
    }
  }
}

impl ClassNaming {
  fn name_for(&self, key: &str, counter: u32) -> String {
    match self {
      ClassNaming::Counter { prefix } => format!("{prefix}{}", to_base36(counter)),
      ClassNaming::Hash => format!("_{}", to_base36(string_hash(key))),
      ClassNaming::Custom(get_class_name) => get_class_name(key),
    }
  }
}

/// Build-scoped registry of class names.
///
/// Entries are append-only: once a key has a name it keeps it for the rest of the build, so
/// separately compiled files agree on the class for identical declarations. One writer at a
/// time; parallel builds give every worker its own state and [`CacheState::merge`] them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheState {
  pub counter: u32,
  /// Cache key to class name, in first-seen order.
  keys: IndexMap<String, String>,
  /// Class name to the first key that took it. Kept in step with `keys` on every insert.
  #[serde(skip)]
  names: HashMap<String, String>,
  /// False until `names` has been built, e.g. right after deserialization.
  #[serde(skip)]
  indexed: bool,
}

impl CacheState {
  pub fn new() -> Self {
    Self::default()
  }

  fn sync_names(&mut self) {
    if self.indexed {
      return;
    }
    self.names.clear();
    for (key, name) in &self.keys {
      self
        .names
        .entry(name.clone())
        .or_insert_with(|| key.clone());
    }
    self.indexed = true;
  }

  /// Every assigned `(key, class name)` pair, in first-seen order.
  pub fn entries(&self) -> &IndexMap<String, String> {
    &self.keys
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.keys.get(key).map(String::as_str)
  }

  /// Class name for `key`, assigning a new one when the key has not been seen.
  pub fn assign(&mut self, key: &str, naming: &ClassNaming) -> String {
    if let Some(name) = self.keys.get(key) {
      return name.clone();
    }
    self.sync_names();

    let base = naming.name_for(key, self.counter);
    self.counter += 1;
    let mut name = base.clone();
    while self.names.contains_key(&name) {
      name = match naming {
        ClassNaming::Counter { prefix } => format!("{prefix}{}", to_base36(self.counter)),
        ClassNaming::Hash | ClassNaming::Custom(_) => format!("{base}{}", to_base36(self.counter)),
      };
      self.counter += 1;
    }

    self.keys.insert(key.to_string(), name.clone());
    self.names.insert(name.clone(), key.to_string());
    name
  }

  /// Record a caller-named group. The caller's name is always used; the counter is untouched.
  pub fn assign_named(&mut self, key: &str, name: &str) -> String {
    self.sync_names();
    if !self.keys.contains_key(key) {
      self.keys.insert(key.to_string(), name.to_string());
      self
        .names
        .entry(name.to_string())
        .or_insert_with(|| key.to_string());
    }
    name.to_string()
  }

  /// Fold another worker's entries into this state, in that worker's first-seen order. An
  /// entry whose name is already used for a different key is renamed.
  pub fn merge(&mut self, other: &CacheState, naming: &ClassNaming) {
    self.sync_names();
    self.counter = self.counter.max(other.counter);
    for (key, name) in &other.keys {
      if self.keys.contains_key(key) {
        continue;
      }
      if self.names.contains_key(name) {
        let renamed = self.assign(key, naming);
        tracing::debug!(key = %key, from = %name, to = %renamed, "Renamed class while merging cache");
      } else {
        self.keys.insert(key.clone(), name.clone());
        self.names.insert(name.clone(), key.clone());
      }
    }
  }
}
