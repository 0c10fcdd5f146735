use jsxstyle_swc_runner::RunnerError;

use crate::config::ErrorCallback;

/// Fatal failures. The file is not transformed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
  #[error("Failed to parse {file}:{line}: {message}")]
  Parse {
    file: String,
    line: usize,
    message: String,
  },
  #[error("Failed to print {file}: {source}")]
  Print {
    file: String,
    #[source]
    source: RunnerError,
  },
}

impl ExtractError {
  pub(crate) fn from_runner(file: &str, error: RunnerError) -> Self {
    match error {
      RunnerError::Parse { line, message, .. } => ExtractError::Parse {
        file: file.to_string(),
        line,
        message,
      },
      source => ExtractError::Print {
        file: file.to_string(),
        source,
      },
    }
  }
}

/// A recoverable problem with one element. Extraction carries on without the offending
/// attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractWarning {
  pub message: String,
  pub source_file: String,
  pub line: usize,
}

/// Funnels warnings to the host callback, or to `tracing` when there is none.
pub struct WarningSink {
  source_file: String,
  callback: Option<ErrorCallback>,
  emitted: Vec<ExtractWarning>,
}

impl WarningSink {
  pub fn new(source_file: &str, callback: Option<ErrorCallback>) -> Self {
    Self {
      source_file: source_file.to_string(),
      callback,
      emitted: Vec::new(),
    }
  }

  pub fn warn(&mut self, message: impl Into<String>, line: usize) {
    let warning = ExtractWarning {
      message: message.into(),
      source_file: self.source_file.clone(),
      line,
    };
    match &self.callback {
      Some(callback) => callback(&warning.message, &warning.source_file, warning.line),
      None => tracing::warn!(
        file = %warning.source_file,
        line = warning.line,
        "{}",
        warning.message
      ),
    }
    self.emitted.push(warning);
  }

  pub fn into_warnings(self) -> Vec<ExtractWarning> {
    self.emitted
  }
}
