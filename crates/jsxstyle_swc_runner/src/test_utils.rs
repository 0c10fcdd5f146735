use swc_core::ecma::visit::VisitMut;

use crate::runner::run_visit;
pub use crate::runner::{RunContext, RunVisitResult};

/// In the future this might be a different type to `RunContext`
pub type RunTestContext = RunContext;

/// File name used by visitor tests. The `.jsx` extension turns on JSX parsing.
pub const TEST_FILE_NAME: &str = "test/file.jsx";

/// Helper to test SWC visitors.
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the result
///
pub fn run_test_visit<V: VisitMut>(
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  run_visit(code, TEST_FILE_NAME, make_visit).unwrap()
}
