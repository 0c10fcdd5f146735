use std::string::FromUtf8Error;

use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as CodegenConfig, Emitter};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

pub struct RunContext {
  /// Source-map in use, used to map spans back to line numbers
  pub source_map: Lrc<SourceMap>,
  /// Unresolved mark from SWC resolver. Identifiers carrying this mark have no binding in the
  /// module.
  pub unresolved_mark: Mark,
}

pub struct RunVisitResult<V> {
  pub output_code: String,
  #[allow(unused)]
  pub visitor: V,
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error("Failed to parse {file_name}:{line}: {message}")]
  Parse {
    file_name: String,
    line: usize,
    message: String,
  },
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
}

/// Pick the parser syntax for a source file.
///
/// TypeScript files are parsed as TypeScript (with JSX for `.tsx`), everything else is parsed
/// as ECMAScript with JSX enabled.
pub fn syntax_for_file_name(file_name: &str) -> Syntax {
  if file_name.ends_with(".ts") || file_name.ends_with(".mts") || file_name.ends_with(".cts") {
    Syntax::Typescript(TsSyntax {
      decorators: true,
      ..Default::default()
    })
  } else if file_name.ends_with(".tsx") {
    Syntax::Typescript(TsSyntax {
      tsx: true,
      decorators: true,
      ..Default::default()
    })
  } else {
    Syntax::Es(EsSyntax {
      jsx: true,
      decorators: true,
      export_default_from: true,
      import_attributes: true,
      ..Default::default()
    })
  }
}

/// Runner of SWC transformations
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the printed result
///
pub fn run_visit<V: VisitMut>(
  code: &str,
  file_name: &str,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunnerError> {
  let (output_code, visitor) =
    run_with_transformation(code, file_name, |context: RunContext, module: &mut Module| {
      let mut visit = make_visit(context);
      module.visit_mut_with(&mut visit);
      visit
    })?;
  Ok(RunVisitResult {
    output_code,
    visitor,
  })
}

/// Parse code, run resolver over it, then run the `transform` function with the parsed module.
/// Prints the module back to source (comments included) and returns it with the transform's
/// result.
pub fn run_with_transformation<R>(
  code: &str,
  file_name: &str,
  transform: impl FnOnce(RunContext, &mut Module) -> R,
) -> Result<(String, R), RunnerError> {
  let source_map = Lrc::new(SourceMap::default());
  let source_file = source_map.new_source_file(
    Lrc::new(FileName::Custom(file_name.to_string())),
    code.into(),
  );
  let comments = SingleThreadedComments::default();
  let syntax = syntax_for_file_name(file_name);

  let lexer = Lexer::new(
    syntax,
    EsVersion::latest(),
    StringInput::from(&*source_file),
    Some(&comments),
  );

  let mut parser = Parser::new_from(lexer);
  let mut module = parser.parse_module().map_err(|error| RunnerError::Parse {
    file_name: file_name.to_string(),
    line: source_map.lookup_char_pos(error.span().lo).line,
    message: error.kind().msg().to_string(),
  })?;

  GLOBALS.set(&Globals::new(), || -> Result<(String, R), RunnerError> {
    let top_level_mark = Mark::new();
    let unresolved_mark = Mark::new();
    module.visit_mut_with(&mut resolver(
      unresolved_mark,
      top_level_mark,
      syntax.typescript(),
    ));

    let context = RunContext {
      source_map: source_map.clone(),
      unresolved_mark,
    };
    let result = transform(context, &mut module);

    let mut output_buffer = vec![];
    let writer = JsWriter::new(source_map.clone(), "\n", &mut output_buffer, None);
    let mut cfg = CodegenConfig::default();
    cfg.target = EsVersion::latest();
    let mut emitter = Emitter {
      cfg,
      cm: source_map.clone(),
      comments: Some(&comments),
      wr: writer,
    };
    emitter.emit_module(&module)?;
    let output_code = String::from_utf8(output_buffer)?;

    Ok((output_code, result))
  })
}
