//! Grading of coding questions inside a contest.

use serde::{Deserialize, Serialize};

use crate::tester::{model::NO_TEST_CASES, TestCase, Verdict};

/// A programmatic question as stored by the contest layer.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CodingQuestion {
    /// Points awarded when every test case passes.
    pub score: u32,
    /// Per-test time limit. Falls back to the judger's default when absent.
    #[serde(default)]
    pub time_limit_seconds: Option<f64>,
    /// Test cases shown to contestants.
    #[serde(default)]
    pub visible_test_cases: Vec<TestCase>,
    /// Test cases kept hidden from contestants.
    #[serde(default)]
    pub invisible_test_cases: Vec<TestCase>,
}

impl CodingQuestion {
    /// Every test case, visible ones first.
    pub fn all_test_cases(&self) -> Vec<TestCase> {
        self.visible_test_cases
            .iter()
            .chain(self.invisible_test_cases.iter())
            .cloned()
            .collect()
    }
}

/// The graded outcome of one coding question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GradedQuestion {
    pub passed: bool,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GradedQuestion {
    /// Nothing to run the code against.
    pub fn no_test_cases() -> Self {
        GradedQuestion {
            passed: false,
            score: 0,
            verdict: None,
            error: Some(NO_TEST_CASES.into()),
        }
    }

    /// Award the full score iff every test case passed.
    pub fn from_verdict(question: &CodingQuestion, verdict: Verdict) -> Self {
        let passed = verdict.all_passed;
        let error = verdict
            .compile_error
            .as_ref()
            .map(|diag| format!("Compilation failed: {}", diag))
            .or_else(|| verdict.error.clone());
        GradedQuestion {
            passed,
            score: if passed { question.score } else { 0 },
            verdict: Some(verdict),
            error,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tester::{aggregate, TestFailure, TestResult};

    fn question() -> CodingQuestion {
        CodingQuestion {
            score: 10,
            time_limit_seconds: None,
            visible_test_cases: vec![TestCase::new("1", "1")],
            invisible_test_cases: vec![TestCase::new("2", "2"), TestCase::new("3", "3")],
        }
    }

    fn pass(case: &TestCase) -> TestResult {
        TestResult {
            input: case.input.clone(),
            produced_output: Some(case.expected_output.clone()),
            expected_output: case.expected_output.clone(),
            passed: true,
            error: None,
        }
    }

    #[test]
    fn test_visible_cases_come_first() {
        let inputs: Vec<_> = question()
            .all_test_cases()
            .into_iter()
            .map(|c| c.input)
            .collect();
        assert_eq!(inputs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_full_score_on_all_passed() {
        let q = question();
        let verdict = aggregate(q.all_test_cases().iter().map(pass).collect());
        let graded = GradedQuestion::from_verdict(&q, verdict);
        assert!(graded.passed);
        assert_eq!(graded.score, 10);
        assert_eq!(graded.error, None);
    }

    #[test]
    fn test_no_partial_score() {
        let q = question();
        let cases = q.all_test_cases();
        let verdict = aggregate(vec![
            pass(&cases[0]),
            pass(&cases[1]),
            TestResult::failed(&cases[2], None, TestFailure::TimeLimitExceeded),
        ]);
        let graded = GradedQuestion::from_verdict(&q, verdict);
        assert!(!graded.passed);
        assert_eq!(graded.score, 0);
    }

    #[test]
    fn test_compile_error_is_reported() {
        let graded =
            GradedQuestion::from_verdict(&question(), Verdict::compile_failed("oops".into()));
        assert_eq!(graded.score, 0);
        assert_eq!(graded.error.as_deref(), Some("Compilation failed: oops"));
    }

    #[test]
    fn test_no_test_cases() {
        let graded = GradedQuestion::no_test_cases();
        assert!(!graded.passed);
        assert_eq!(graded.error.as_deref(), Some(NO_TEST_CASES));
    }
}
