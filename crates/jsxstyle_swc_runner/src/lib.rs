pub mod runner;
pub mod test_utils;

pub use runner::{
  run_visit, run_with_transformation, syntax_for_file_name, RunContext, RunVisitResult,
  RunnerError,
};
