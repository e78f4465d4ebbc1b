use err_derive::Error;

use crate::lang::NotSupported;

/// Submission-level failures. Per-test failures never show up here; they are
/// recorded in [`crate::tester::TestResult::error`].
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error(display = "Unsupported language: {}", _0)]
    UnsupportedLanguage(String),

    #[error(display = "Invalid submission: {}", _0)]
    InvalidSubmission(String),

    #[error(display = "Compilation failed: {}", _0)]
    Compile(String),

    #[error(display = "Workspace error: {}", _0)]
    Workspace(#[error(source)] std::io::Error),
}

impl From<NotSupported> for JudgeError {
    fn from(e: NotSupported) -> Self {
        JudgeError::UnsupportedLanguage(e.0)
    }
}
