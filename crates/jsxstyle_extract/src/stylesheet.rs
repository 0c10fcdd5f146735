use std::fmt::Write;

use indexmap::IndexMap;

use crate::style_keys::RuleRecord;

#[derive(Debug, Default)]
struct ClassBlock {
  comments: Vec<String>,
  rules: Vec<RuleRecord>,
}

/// Per-file stylesheet, one block per class name in the order classes were first emitted.
#[derive(Debug, Default)]
pub struct StylesheetBuffer {
  classes: IndexMap<String, ClassBlock>,
}

/// Where a rule came from, printed as a comment above its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance<'a> {
  pub source_file: &'a str,
  pub start_line: usize,
  pub end_line: usize,
  pub display_name: &'a str,
}

impl Provenance<'_> {
  pub fn comment(&self) -> String {
    if self.end_line > self.start_line {
      format!(
        "/* {}:{}-{} ({}) */",
        self.source_file, self.start_line, self.end_line, self.display_name
      )
    } else {
      format!(
        "/* {}:{} ({}) */",
        self.source_file, self.start_line, self.display_name
      )
    }
  }
}

impl StylesheetBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.classes.is_empty()
  }

  pub fn class_count(&self) -> usize {
    self.classes.len()
  }

  /// Record that an element uses `class_name`. The rules are kept from the first call.
  pub fn add(&mut self, class_name: &str, rules: &[RuleRecord], provenance: &Provenance<'_>) {
    let block = self
      .classes
      .entry(class_name.to_string())
      .or_insert_with(|| ClassBlock {
        comments: Vec::new(),
        rules: rules.to_vec(),
      });
    let comment = provenance.comment();
    if !block.comments.contains(&comment) {
      block.comments.push(comment);
    }
  }

  pub fn to_css(&self) -> String {
    let mut out = String::new();
    for (class_name, block) in &self.classes {
      for comment in &block.comments {
        out.push_str(comment);
        out.push('\n');
      }
      for rule in &block.rules {
        write_rule(&mut out, class_name, rule);
      }
    }
    out
  }
}

fn write_rule(out: &mut String, class_name: &str, rule: &RuleRecord) {
  let selector = rule.selector.to_css(class_name);
  let indent = if rule.selector.media_query.is_some() {
    "  "
  } else {
    ""
  };

  if let Some(query) = &rule.selector.media_query {
    let _ = writeln!(out, "@media {query} {{");
  }
  let _ = writeln!(out, "{indent}{selector} {{");
  for (property, value) in &rule.declarations {
    let _ = writeln!(out, "{indent}  {property}:{value};");
  }
  let _ = writeln!(out, "{indent}}}");
  if rule.selector.media_query.is_some() {
    out.push_str("}\n");
  }
}

#[cfg(test)]
mod tests {
  use indoc::indoc;

  use super::*;
  use crate::style_keys::Selector;
  use pretty_assertions::assert_eq;

  fn rule(selector: Selector, declarations: &[(&str, &str)]) -> RuleRecord {
    RuleRecord {
      selector,
      declarations: declarations
        .iter()
        .map(|(property, value)| (property.to_string(), value.to_string()))
        .collect(),
    }
  }

  #[test]
  fn prints_blocks_with_provenance() {
    let mut buffer = StylesheetBuffer::new();
    let block = vec![rule(Selector::default(), &[("display", "block")])];
    let hover = vec![
      rule(Selector::default(), &[("thing", "wow")]),
      rule(
        Selector {
          pseudo_class: Some("hover".into()),
          ..Default::default()
        },
        &[("thing", "ok")],
      ),
      rule(
        Selector {
          media_query: Some("screen".into()),
          ..Default::default()
        },
        &[("color", "red")],
      ),
    ];

    let first = Provenance {
      source_file: "test/file.js",
      start_line: 2,
      end_line: 2,
      display_name: "Block",
    };
    let second = Provenance {
      source_file: "test/file.js",
      start_line: 3,
      end_line: 5,
      display_name: "Block",
    };
    buffer.add("_x0", &block, &first);
    buffer.add("_x0", &block, &second);
    buffer.add("_x0", &block, &second);
    buffer.add("_x1", &hover, &second);

    assert_eq!(
      buffer.to_css(),
      indoc! {"
        /* test/file.js:2 (Block) */
        /* test/file.js:3-5 (Block) */
        ._x0 {
          display:block;
        }
        /* test/file.js:3-5 (Block) */
        ._x1 {
          thing:wow;
        }
        ._x1:hover {
          thing:ok;
        }
        @media screen {
          ._x1 {
            color:red;
          }
        }
      "}
    );
  }
}
