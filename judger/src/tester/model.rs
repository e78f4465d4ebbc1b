use err_derive::Error;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use crate::lang::LanguageSpec;

use super::utils::duration_from_secs;

/// Marker reported for a submission that has nothing to be judged against.
pub const NO_TEST_CASES: &str = "No test cases available";

/// Diagnostic reported when the compiler runs past its deadline.
pub const COMPILE_TIMED_OUT: &str = "compilation timed out";

/// One input/expected-output pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    #[serde(rename = "output", alias = "expected_output", default)]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        TestCase {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// How much detail a judging run reports back.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum JudgeMode {
    /// A graded contest submission.
    Submit,
    /// A preview run. Standard error of normally exiting programs is
    /// surfaced in [`TestResult::error`].
    Trial,
}

impl Default for JudgeMode {
    fn default() -> Self {
        JudgeMode::Submit
    }
}

/// A validated judging request, exclusively owned by one judging run.
#[derive(Debug, Clone)]
pub struct Submission {
    pub language: Arc<LanguageSpec>,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
    pub per_test_timeout: Duration,
}

impl Submission {
    /// Returns `Err(reason)` if the time limit is not a positive number.
    pub fn new(
        language: Arc<LanguageSpec>,
        source_code: String,
        test_cases: Vec<TestCase>,
        per_test_timeout_seconds: f64,
    ) -> Result<Self, String> {
        let per_test_timeout = duration_from_secs(per_test_timeout_seconds).ok_or_else(|| {
            format!(
                "time limit must be a positive number of seconds, got {}",
                per_test_timeout_seconds
            )
        })?;
        Ok(Submission {
            language,
            source_code,
            test_cases,
            per_test_timeout,
        })
    }
}

/// Result of the build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    CompileError(String),
}

/// Why a single test case failed to produce a comparable output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestFailure {
    #[error(display = "Time limit exceeded")]
    TimeLimitExceeded,

    #[error(display = "Runtime error: {}", _0)]
    RuntimeError(String),

    #[error(display = "{}", _0)]
    SpawnFailed(String),
}

/// The judging outcome for a single test case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub input: String,
    #[serde(rename = "output")]
    pub produced_output: Option<String>,
    pub expected_output: String,
    pub passed: bool,
    pub error: Option<String>,
}

impl TestResult {
    pub fn failed(case: &TestCase, produced_output: Option<String>, failure: TestFailure) -> Self {
        TestResult {
            input: case.input.clone(),
            produced_output,
            expected_output: case.expected_output.clone(),
            passed: false,
            error: Some(failure.to_string()),
        }
    }
}

/// The complete judging outcome for one submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub results: Vec<TestResult>,
    pub all_passed: bool,
    /// Compiler diagnostics. When present, no test case was run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_error: Option<String>,
    /// Submission-level marker, e.g. [`NO_TEST_CASES`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn compile_failed(diagnostics: String) -> Self {
        Verdict {
            results: vec![],
            all_passed: false,
            compile_error: Some(diagnostics),
            error: None,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}
