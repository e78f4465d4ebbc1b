//! Judging engine of the contest platform.
//!
//! Takes untrusted source code in one of several languages, builds it inside
//! a throwaway workspace, runs it once per test case under a wall-clock limit,
//! and reports a per-test [`tester::Verdict`].

pub mod config;
pub mod fs;
pub mod judge;
pub mod lang;
pub mod question;
pub mod runner;
pub mod tester;

#[cfg(test)]
mod test;

pub use config::JudgerConfig;
pub use judge::{Judge, JudgeError, SubmissionRequest};
