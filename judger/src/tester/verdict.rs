use super::model::{TestResult, Verdict, NO_TEST_CASES};

/// Fold per-test results into a verdict. Performs no I/O.
///
/// An empty result list never counts as passing.
pub fn aggregate(results: Vec<TestResult>) -> Verdict {
    if results.is_empty() {
        return Verdict {
            results,
            all_passed: false,
            compile_error: None,
            error: Some(NO_TEST_CASES.into()),
        };
    }
    let all_passed = results.iter().all(|r| r.passed);
    Verdict {
        results,
        all_passed,
        compile_error: None,
        error: None,
    }
}
