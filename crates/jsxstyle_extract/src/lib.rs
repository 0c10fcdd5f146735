//! Build-time extraction of static styles from jsxstyle components.
//!
//! [`extract_styles`] parses one source file, moves every style prop that can be resolved at
//! build time into generated CSS classes, and returns the rewritten source together with the
//! stylesheet those classes live in.

pub mod attributes;
pub mod bindings;
pub mod cache;
pub mod catalog;
pub mod class_name;
pub mod config;
pub mod errors;
pub mod evaluator;
pub mod hash;
pub mod hoist;
pub mod imports;
pub mod lite_mode;
pub mod reserved;
pub mod rewriter;
pub mod style_keys;
pub mod stylesheet;
pub mod value;
mod visitor;

use jsxstyle_swc_runner::run_with_transformation;

pub use cache::{CacheState, ClassNaming};
pub use config::{ClassNamingMode, CustomComponent, ErrorCallback, ExtractOptions, LiteMode};
pub use errors::{ExtractError, ExtractWarning};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutput {
  pub js: String,
  /// Empty when nothing was extracted.
  pub css: String,
  /// Name the stylesheet is referenced by, when there is one.
  pub css_file_name: Option<String>,
  pub warnings: Vec<ExtractWarning>,
}

/// Extract static styles from one source file.
///
/// `cache` is shared by every file of a build so that identical declarations get the same
/// class name everywhere. Only parse and print failures are errors; everything else is
/// reported as a warning and leaves the affected element to the runtime.
#[tracing::instrument(level = "debug", skip_all, fields(file = %source_file))]
pub fn extract_styles(
  source: &str,
  source_file: &str,
  cache: &mut CacheState,
  options: &ExtractOptions,
) -> Result<ExtractOutput, ExtractError> {
  let (js, output) = run_with_transformation(source, source_file, |context, module| {
    visitor::transform_module(module, &context, source_file, cache, options)
  })
  .map_err(|error| ExtractError::from_runner(source_file, error))?;

  let css_file_name =
    (!output.css.is_empty()).then(|| stylesheet_name(source_file, &options.stylesheet_suffix));
  Ok(ExtractOutput {
    js: if output.modified {
      js
    } else {
      source.to_string()
    },
    css: output.css,
    css_file_name,
    warnings: output.warnings,
  })
}

/// `src/App.jsx` → `src/App.jsxstyle.css` for the default suffix.
pub fn stylesheet_name(source_file: &str, suffix: &str) -> String {
  let file_start = source_file
    .rfind(|c: char| c == '/' || c == '\\')
    .map_or(0, |index| index + 1);
  let (directory, file) = source_file.split_at(file_start);
  let stem = match file.rfind('.') {
    Some(index) if index > 0 => &file[..index],
    _ => file,
  };
  format!("{directory}{stem}{suffix}")
}
