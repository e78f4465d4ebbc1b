//! Judging stages: build, execute, aggregate.
//!
//! The stages only describe *what* to run and how to interpret the result.
//! Processes are started through [`crate::runner::CommandRunner`].

pub mod build;
pub mod exec;
pub mod model;
pub mod utils;
pub mod verdict;

pub use build::build;
pub use exec::ExecStage;
pub use model::{
    BuildOutcome, JudgeMode, Submission, TestCase, TestFailure, TestResult, Verdict,
};
pub use verdict::aggregate;
